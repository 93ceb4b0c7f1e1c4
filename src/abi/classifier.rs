use crate::{
    abi::{
        Abi,
        FunctionDescriptor,
    },
    primitives::{
        MethodClassification,
        Selector,
    },
};

use std::collections::HashMap;
use tracing::warn;

/// Resolves each selector against `abi` and buckets the matching function
/// names into reads (`view`/`pure`) and writes (everything else).
///
/// Selectors without a matching function are logged and left out of both
/// lists. Output order follows `selectors`.
pub fn classify(abi: &Abi, selectors: &[Selector]) -> MethodClassification {
    let functions: HashMap<Selector, FunctionDescriptor> = abi
        .functions()
        .map(|function| (function.selector(), function))
        .collect();

    let mut classification = MethodClassification::default();
    for selector in selectors {
        let Some(function) = functions.get(selector) else {
            warn!(
                target: "diamond-inspector::abi",
                %selector,
                "Selector not found in ABI, skipping"
            );
            continue;
        };

        if function.mutability().is_read() {
            classification.read_methods.push(function.name.clone());
        } else {
            classification.write_methods.push(function.name.clone());
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        primitives::fixed_bytes,
        test_utils::{
            selector_of,
            SAMPLE_ABI,
        },
    };
    use serde_json::json;

    #[test]
    fn test_read_and_write_split() {
        let abi = Abi::new(vec![
            json!({
                "type": "function",
                "name": "balanceOf",
                "inputs": [{ "name": "owner", "type": "address" }],
                "stateMutability": "view"
            }),
            json!({
                "type": "function",
                "name": "transfer",
                "inputs": [
                    { "name": "to", "type": "address" },
                    { "name": "amount", "type": "uint256" }
                ],
                "stateMutability": "nonpayable"
            }),
        ]);

        let classification = classify(
            &abi,
            &[fixed_bytes!("70a08231"), fixed_bytes!("a9059cbb")],
        );
        assert_eq!(classification.read_methods, vec!["balanceOf"]);
        assert_eq!(classification.write_methods, vec!["transfer"]);
    }

    #[test]
    fn test_every_known_selector_lands_in_exactly_one_bucket() {
        let abi = Abi::from_json(SAMPLE_ABI).unwrap();
        for function in abi.functions() {
            let classification = classify(&abi, &[function.selector()]);
            assert_eq!(classification.len(), 1, "{}", function.signature());

            let expected_read = function.mutability().is_read();
            assert_eq!(
                classification.read_methods.contains(&function.name),
                expected_read
            );
            assert_eq!(
                classification.write_methods.contains(&function.name),
                !expected_read
            );
        }
    }

    #[test]
    fn test_unknown_selectors_are_omitted() {
        let abi = Abi::from_json(SAMPLE_ABI).unwrap();
        let classification = classify(
            &abi,
            &[
                fixed_bytes!("deadbeef"),
                selector_of("name()"),
                fixed_bytes!("00000000"),
            ],
        );
        assert_eq!(classification.read_methods, vec!["name"]);
        assert!(classification.write_methods.is_empty());
    }

    #[test]
    fn test_payable_and_pure() {
        let abi = Abi::from_json(SAMPLE_ABI).unwrap();
        let classification = classify(
            &abi,
            &[selector_of("mint(uint256)"), selector_of("version()")],
        );
        assert_eq!(classification.read_methods, vec!["version"]);
        assert_eq!(classification.write_methods, vec!["mint"]);
    }

    #[test]
    fn test_malformed_abi_yields_empty() {
        let abi = Abi::new(vec![json!(1), json!({ "type": "function" })]);
        assert!(classify(&abi, &[fixed_bytes!("a9059cbb")]).is_empty());
    }
}
