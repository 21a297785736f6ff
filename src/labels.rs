//! Label reconciliation — one mailbox label per category.
//!
//! Each category gets a label named `Triage/<Category>`. Reconciliation is
//! idempotent: existing labels are reused, missing ones are created, and a
//! second run with the same category set creates nothing.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::MailboxError;
use crate::mailbox::Mailbox;

/// Namespace prefix for labels owned by this service.
pub const LABEL_PREFIX: &str = "Triage";

/// Mailbox label name for a category.
pub fn label_name(category: &str) -> String {
    format!("{LABEL_PREFIX}/{category}")
}

/// Map from category name to mailbox label id, built once per cycle.
pub type CategoryLabelMap = HashMap<String, String>;

/// Ensure a label exists for every category; return the id map.
///
/// A failed label *listing* degrades to "nothing found" — logged distinctly
/// so it is never mistaken for labels being absent — after which every
/// category goes through the create path. A failed *creation* is fatal and
/// propagates: a partial map is never returned.
pub async fn reconcile(
    mailbox: &dyn Mailbox,
    categories: &[String],
) -> Result<CategoryLabelMap, MailboxError> {
    let existing: HashMap<String, String> = match mailbox.list_labels().await {
        Ok(labels) => labels.into_iter().map(|l| (l.name, l.id)).collect(),
        Err(e) => {
            warn!(error = %e, "Label listing failed; treating all labels as missing");
            HashMap::new()
        }
    };

    let mut map = CategoryLabelMap::with_capacity(categories.len());
    for category in categories {
        let name = label_name(category);
        let id = match existing.get(&name) {
            Some(id) => id.clone(),
            None => {
                let label = mailbox.create_label(&name).await?;
                info!(label = %name, id = %label.id, "Created mailbox label");
                label.id
            }
        };
        map.insert(category.clone(), id);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_are_prefixed() {
        assert_eq!(label_name("Important"), "Triage/Important");
        assert_eq!(label_name("Optional"), "Triage/Optional");
    }
}
