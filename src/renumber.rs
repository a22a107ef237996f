//! Final id renumbering.
//!
//! [`crate::driver`] assembles use-case output in use-case order, but each
//! use case's [`TestCase`]/[`DatasetExample`] ids are only unique and
//! correctly ordered *within* that use case (see
//! `evalforge_orchestrator::generate::provisional_id`). This module walks
//! the already use-case-ordered, format-outer/variation-inner collections
//! once and assigns the final sequential `tc_NNN`/`ex_NNN` ids, rewriting
//! every reference so `example.test_case_id` still resolves after the
//! rename.

use std::collections::HashMap;

use evalforge_model::{DatasetExample, TEST_CASE_PREFIX, TestCase, make_id, EXAMPLE_PREFIX};

/// Renumber `test_cases` and `examples` (already in final cross-use-case
/// order) to sequential `tc_001`, `tc_002`, ... and `ex_001`, `ex_002`, ...,
/// remapping `example.test_case_id` through the same substitution.
pub fn renumber(mut test_cases: Vec<TestCase>, mut examples: Vec<DatasetExample>) -> (Vec<TestCase>, Vec<DatasetExample>) {
    let mut tc_map: HashMap<String, String> = HashMap::with_capacity(test_cases.len());
    for (index, tc) in test_cases.iter_mut().enumerate() {
        let final_id = make_id(TEST_CASE_PREFIX, index + 1);
        tc_map.insert(std::mem::replace(&mut tc.id, final_id.clone()), final_id);
    }

    for (index, example) in examples.iter_mut().enumerate() {
        example.id = make_id(EXAMPLE_PREFIX, index + 1);
        if let Some(final_tc_id) = tc_map.get(&example.test_case_id) {
            example.test_case_id = final_tc_id.clone();
        }
    }

    (test_cases, examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalforge_model::{Case, DatasetExample, Format, InputData, Message, Role};
    use std::collections::BTreeMap;

    fn tc(id: &str) -> TestCase {
        TestCase {
            id: id.to_string(),
            case: Case::SupportBot,
            use_case_id: "uc_001".to_string(),
            name: "n".to_string(),
            description: "d".to_string(),
            parameter_variation_axes: vec!["a".into(), "b".into()],
            parameters: BTreeMap::new(),
            policy_ids: vec![],
        }
    }

    fn example(id: &str, test_case_id: &str) -> DatasetExample {
        DatasetExample {
            id: id.to_string(),
            case: Case::SupportBot,
            format: Format::SingleTurnQa,
            use_case_id: "uc_001".to_string(),
            test_case_id: test_case_id.to_string(),
            input: InputData {
                messages: vec![Message::new(Role::User, "hi")],
                target_message_index: None,
            },
            expected_output: "out".to_string(),
            evaluation_criteria: vec!["a".into(), "b".into(), "c".into()],
            policy_ids: vec![],
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn assigns_sequential_ids_and_rewires_test_case_id() {
        let test_cases = vec![tc("tc_u0_0001"), tc("tc_u0_0002")];
        let examples = vec![
            example("ex_u0_0001", "tc_u0_0001"),
            example("ex_u0_0002", "tc_u0_0002"),
        ];
        let (test_cases, examples) = renumber(test_cases, examples);
        assert_eq!(test_cases[0].id, "tc_001");
        assert_eq!(test_cases[1].id, "tc_002");
        assert_eq!(examples[0].id, "ex_001");
        assert_eq!(examples[0].test_case_id, "tc_001");
        assert_eq!(examples[1].test_case_id, "tc_002");
    }

    #[test]
    fn preserves_input_order() {
        let test_cases = vec![tc("tc_u1_0001"), tc("tc_u0_0001")];
        let examples = vec![
            example("ex_u1_0001", "tc_u1_0001"),
            example("ex_u0_0001", "tc_u0_0001"),
        ];
        let (test_cases, examples) = renumber(test_cases, examples);
        // Order is whatever the caller already assembled; renumber never
        // reorders, it only reassigns ids in place.
        assert_eq!(test_cases[0].id, "tc_001");
        assert_eq!(examples[0].test_case_id, "tc_001");
    }
}
