use serde::Serialize;

/// Counters reported by the engine for one import operation.
///
/// Field order follows GnuPG's `IMPORT_RES` status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub considered: u32,
    pub no_user_id: u32,
    pub imported: u32,
    pub imported_rsa: u32,
    pub unchanged: u32,
    pub new_user_ids: u32,
    pub new_subkeys: u32,
    pub new_signatures: u32,
    pub new_revocations: u32,
    pub secret_read: u32,
    pub secret_imported: u32,
    pub secret_unchanged: u32,
    pub not_imported: u32,
}

/// Outcome of a successful import, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportInfo {
    pub result: ImportResult,
    /// Human-readable description of what changed.
    pub summary: String,
}

impl std::ops::AddAssign for ImportResult {
    fn add_assign(&mut self, other: Self) {
        self.considered += other.considered;
        self.no_user_id += other.no_user_id;
        self.imported += other.imported;
        self.imported_rsa += other.imported_rsa;
        self.unchanged += other.unchanged;
        self.new_user_ids += other.new_user_ids;
        self.new_subkeys += other.new_subkeys;
        self.new_signatures += other.new_signatures;
        self.new_revocations += other.new_revocations;
        self.secret_read += other.secret_read;
        self.secret_imported += other.secret_imported;
        self.secret_unchanged += other.secret_unchanged;
        self.not_imported += other.not_imported;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_accumulate() {
        let mut total = ImportResult {
            considered: 1,
            imported: 1,
            ..Default::default()
        };
        total += ImportResult {
            considered: 2,
            unchanged: 2,
            ..Default::default()
        };
        assert_eq!(total.considered, 3);
        assert_eq!(total.imported, 1);
        assert_eq!(total.unchanged, 2);
    }
}
