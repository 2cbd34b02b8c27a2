use anyhow::{Context, Result, bail};
use glide_sim::PolicySpec;

/// Policies compared when `--policies` is not given.
pub const DEFAULT_POLICIES: &str = "never,always,three-zones:0.9:0.5";

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve CLI policy tokens, expanding `all` to the reference set.
///
/// Duplicates are dropped so each policy is flown once.
///
/// # Errors
///
/// Returns an error for unknown or malformed tokens, or when no policy is
/// left.
pub fn resolve_policies(tokens: &[String]) -> Result<Vec<PolicySpec>> {
    let mut specs: Vec<PolicySpec> = Vec::new();
    for token in tokens {
        let expanded = if token.eq_ignore_ascii_case("all") {
            split_csv(DEFAULT_POLICIES)
        } else {
            vec![token.clone()]
        };
        for item in expanded {
            let spec: PolicySpec = item
                .parse()
                .with_context(|| format!("invalid policy '{item}'"))?;
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
    }
    if specs.is_empty() {
        bail!("no policies selected");
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" never, ,always,  three-zones:0.9:0.5 ");
        assert_eq!(parts, vec!["never", "always", "three-zones:0.9:0.5"]);
    }

    #[test]
    fn all_expands_and_deduplicates() {
        let specs = resolve_policies(&split_csv("never,all")).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0], PolicySpec::Never);
    }

    #[test]
    fn rejects_unknown_and_empty_selection() {
        let err = resolve_policies(&split_csv("never,sometimes")).unwrap_err();
        assert!(format!("{err:#}").contains("sometimes"));
        assert!(resolve_policies(&[]).is_err());
    }
}
