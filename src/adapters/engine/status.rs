use crate::core::models::import_result::ImportResult;

const STATUS_PREFIX: &str = "[GNUPG:] ";

/// Extract the import counters from `--status-fd` output.
///
/// Returns `None` when the engine did not report an `IMPORT_RES` line.
/// If several imports ran in one invocation, the last line wins.
pub fn parse_import_result(status: &str) -> Option<ImportResult> {
    let line = status
        .lines()
        .filter_map(|l| l.strip_prefix(STATUS_PREFIX))
        .filter_map(|l| l.strip_prefix("IMPORT_RES "))
        .last()?;

    let counts: Vec<u32> = line
        .split_whitespace()
        .map(|n| n.parse().unwrap_or_default())
        .collect();
    let n = |i: usize| counts.get(i).copied().unwrap_or_default();

    Some(ImportResult {
        considered: n(0),
        no_user_id: n(1),
        imported: n(2),
        imported_rsa: n(3),
        unchanged: n(4),
        new_user_ids: n(5),
        new_subkeys: n(6),
        new_signatures: n(7),
        new_revocations: n(8),
        secret_read: n(9),
        secret_imported: n(10),
        secret_unchanged: n(11),
        // 12 is skipped_new_keys
        not_imported: n(13),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_res() {
        let status = "\
[GNUPG:] IMPORT_OK 1 0123456789ABCDEF0123456789ABCDEF01234567
[GNUPG:] IMPORT_RES 1 0 0 0 0 2 1 5 0 0 0 0 0 0 0
";
        let result = parse_import_result(status).unwrap();
        assert_eq!(result.considered, 1);
        assert_eq!(result.imported, 0);
        assert_eq!(result.unchanged, 0);
        assert_eq!(result.new_user_ids, 2);
        assert_eq!(result.new_subkeys, 1);
        assert_eq!(result.new_signatures, 5);
    }

    #[test]
    fn short_lines_from_old_versions() {
        let result = parse_import_result("[GNUPG:] IMPORT_RES 2 0 2 0 0\n").unwrap();
        assert_eq!(result.imported, 2);
        assert_eq!(result.not_imported, 0);
    }

    #[test]
    fn missing_status_line() {
        assert!(parse_import_result("gpg: no valid OpenPGP data found.\n").is_none());
    }
}
