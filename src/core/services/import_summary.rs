use crate::core::models::import_result::ImportResult;

/// Turns engine import counters into user-facing text.
pub struct ImportSummary;

impl ImportSummary {
    /// Describe the outcome of an import in one message.
    ///
    /// An update that added material lists each non-zero counter on its own
    /// bullet line.
    pub fn summarize(result: &ImportResult) -> String {
        if result.considered == 0 {
            return "No key was imported or updated.".to_string();
        }
        if result.imported != 0 {
            return "The key was imported into the local key ring.".to_string();
        }
        if result.unchanged != 0 {
            return "The existing key in the key ring was not changed.".to_string();
        }

        let mut info = String::from("The key was updated in the local key ring:");
        let counters = [
            (result.new_user_ids, "new user ID", "new user IDs"),
            (result.new_subkeys, "new subkey", "new subkeys"),
            (result.new_signatures, "new signature", "new signatures"),
            (result.new_revocations, "new revocation", "new revocations"),
        ];
        for (count, singular, plural) in counters {
            if count > 0 {
                let noun = if count == 1 { singular } else { plural };
                info.push_str(&format!("\n• {count} {noun}"));
            }
        }
        info
    }
}
