//! Hash generation

use crate::{opts, output, HashType, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use mpqchain::hash::{hash_string, hash_type};
use serde::Serialize;

#[derive(Serialize)]
struct HashValue {
    filename: String,
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

const ALL_TYPES: [(HashType, &str); 4] = [
    (HashType::TableOffset, "Table offset"),
    (HashType::NameA, "Name A"),
    (HashType::NameB, "Name B"),
    (HashType::FileKey, "File key"),
];

fn hash_type_id(kind: HashType) -> u32 {
    match kind {
        HashType::TableOffset => hash_type::TABLE_OFFSET,
        HashType::NameA => hash_type::NAME_A,
        HashType::NameB => hash_type::NAME_B,
        HashType::FileKey => hash_type::FILE_KEY,
    }
}

/// Generate hash values for a filename
pub fn generate(filename: &str, kind: Option<HashType>) -> Result<()> {
    let opts = opts();

    let selected: Vec<(HashType, &str)> = match kind {
        Some(kind) => ALL_TYPES.iter().copied().filter(|(k, _)| *k == kind).collect(),
        None => ALL_TYPES.to_vec(),
    };

    let values: Vec<HashValue> = selected
        .iter()
        .map(|&(kind, label)| HashValue {
            filename: filename.to_string(),
            kind: label.to_string(),
            value: format!("{:#010x}", hash_string(filename, hash_type_id(kind))),
        })
        .collect();

    if opts.output != OutputFormat::Text {
        output::print_output(&values)?;
        return Ok(());
    }

    if kind.is_some() {
        for value in &values {
            println!("{}", value.value);
        }
        return Ok(());
    }

    println!("{}", "Hash values:".bold());
    for value in &values {
        println!("  {:<13} {}", format!("{}:", value.kind), value.value);
    }
    Ok(())
}
