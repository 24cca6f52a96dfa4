//! Tests for optimization passes.

use syndra_ir::Circuit;

use crate::pass::Pass;
use crate::property::PropertySet;

use super::LocalOptimization;

fn optimize(text: &str) -> String {
    let mut circuit: Circuit = text.parse().unwrap();
    LocalOptimization
        .run(&mut circuit, &mut PropertySet::new())
        .unwrap();
    circuit.to_string()
}

#[test]
fn test_hh_cancels() {
    assert_eq!(optimize("R 0\nTICK\nH 0\nTICK\nH 0\nTICK\nM 0\n"), "R 0\nTICK\nM 0\n");
}

#[test]
fn test_rotations_compose_to_one_gate() {
    assert_eq!(optimize("H 0\nTICK\nS 0\nTICK\nH 0\n"), "SQRT_X 0\n");
}

#[test]
fn test_rotation_before_reset_removed() {
    assert_eq!(optimize("H 0 1\nTICK\nR 0\n"), "H 1\nTICK\nR 0\n");
}

#[test]
fn test_disjoint_steps_merge() {
    assert_eq!(
        optimize("CZ 0 1\nTICK\nCZ 2 3\nTICK\nCZ 1 2\n"),
        "CZ 0 1 2 3\nTICK\nCZ 1 2\n"
    );
}

#[test]
fn test_interaction_then_swap_fuses() {
    assert_eq!(optimize("CZ 0 1\nTICK\nSWAP 0 1\n"), "CZSWAP 0 1\n");
}

#[test]
fn test_measurement_order_is_kept() {
    let text = "M 1\nTICK\nM 0\nDETECTOR rec[-2]\n";
    let out = optimize(text);
    assert_eq!(out, "M 1 0\nDETECTOR rec[-2]\n");
}

#[test]
fn test_unsupported_instruction_is_left_alone() {
    let text = "SQRT_XX 0 1\nTICK\nH 0\nTICK\nH 0\n";
    assert_eq!(optimize(text), text);
}

#[test]
fn test_noise_blocks_fusion() {
    let text = "H 0\nDEPOLARIZE1(0.1) 0\nTICK\nH 0\n";
    assert_eq!(optimize(text), text);
}
