use std::collections::BTreeSet;

use super::Node;
use crate::error::{NavigationError, NavigationResult};
use crate::navigation::NavigationIdentifier;

/// Check the structure of a node tree before it is navigated.
///
/// The root must be a container; every container must be non-empty with
/// unique child identifiers, and every jump target must name a sibling or a
/// reserved identifier.
pub fn validate_tree(root: &Node) -> NavigationResult<()> {
    if !root.is_container() {
        return Err(NavigationError::NotAContainer {
            identifier: root.identifier.clone(),
        });
    }
    validate_container(root)
}

fn validate_container(container: &Node) -> NavigationResult<()> {
    let children = container.children().unwrap_or(&[]);
    if children.is_empty() {
        return Err(NavigationError::EmptyContainer {
            identifier: container.identifier.clone(),
        });
    }

    let mut seen = BTreeSet::new();
    for child in children {
        if !seen.insert(child.identifier.as_str()) {
            return Err(NavigationError::DuplicateIdentifier {
                container: container.identifier.clone(),
                identifier: child.identifier.clone(),
            });
        }
    }

    for child in children {
        let targets = child
            .next_node_identifier
            .iter()
            .chain(child.survey_rules.iter().map(|rule| &rule.skip_to_identifier));
        for target in targets {
            let known = NavigationIdentifier::parse(target).is_some()
                || seen.contains(target.as_str());
            if !known {
                return Err(NavigationError::UnknownIdentifier {
                    container: container.identifier.clone(),
                    identifier: target.clone(),
                });
            }
        }
        if child.is_container() {
            validate_container(child)?;
        }
    }

    Ok(())
}
