//! Special MPQ files: the (listfile)

/// Name of the embedded file listing the archive's contents
pub const LISTFILE: &str = "(listfile)";

/// Parse a (listfile) into individual filenames
///
/// The (listfile) format supports:
/// - One filename per line, CRLF or LF terminated
/// - Comments starting with ';' or '#'
/// - Optional file metadata after ';' on each line
/// - Empty lines are ignored
pub fn parse_listfile(data: &[u8]) -> Vec<String> {
    let content = String::from_utf8_lossy(data);
    if matches!(content, std::borrow::Cow::Owned(_)) {
        log::warn!("(listfile) contains invalid UTF-8, using lossy conversion");
    }

    let files: Vec<String> = content
        .split(['\r', '\n', '\0'])
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                return None;
            }

            let filename = match line.find(';') {
                Some(pos) => line[..pos].trim(),
                None => line,
            };
            (!filename.is_empty()).then(|| filename.to_string())
        })
        .collect();

    log::debug!("Parsed {} files from (listfile)", files.len());
    files
}
