//! Machine Tests
//!
//! End-to-end behavior of the machine state: stitches, transfers, racking,
//! carriers and gauges.

use knit_machine::carriers::CarrierState;
use knit_machine::{CarrierId, CarrierSet, ErrorKind, MachineSpec, MachineState, Needle};
use test_case::test_case;

fn machine() -> MachineState {
    MachineState::new(MachineSpec::new(40, 4.0, 4, 5)).unwrap()
}

fn carrier(id: usize) -> CarrierSet {
    CarrierSet::single(CarrierId::new(id))
}

// === Stitches ===

#[test]
fn test_knit_overwrites_with_pulled_through_loop() {
    let mut state = machine();
    state.bring_in(CarrierId::new(1)).unwrap();
    let needle = Needle::front(10);

    let first = state.knit(needle, &carrier(1)).unwrap();
    let second = state.knit(needle, &carrier(1)).unwrap();

    assert_eq!(state.at(needle).unwrap(), second.as_slice());
    let parents: Vec<_> = state
        .knit_graph()
        .get(second[0])
        .unwrap()
        .parent_ids()
        .collect();
    assert_eq!(parents, first);
    assert_eq!(state.knit_graph().stitch_count(), 1);
}

#[test]
fn test_plated_knit_makes_loop_per_carrier() {
    let mut state = machine();
    state.bring_in(CarrierId::new(1)).unwrap();
    state.bring_in(CarrierId::new(3)).unwrap();
    let plating: CarrierSet = [1, 3].into_iter().map(CarrierId::new).collect();

    let made = state.knit(Needle::back(2), &plating).unwrap();
    assert_eq!(made.len(), 2);
    assert_eq!(
        state.carriers().carrier(CarrierId::new(3)).unwrap().loops_since_release(),
        1
    );
}

#[test]
fn test_knit_with_no_carriers_drops_loops() {
    let mut state = machine();
    state.bring_in(CarrierId::new(1)).unwrap();
    let needle = Needle::front(4);
    state.knit(needle, &carrier(1)).unwrap();

    let made = state.knit(needle, &CarrierSet::new(Vec::new())).unwrap();
    assert!(made.is_empty());
    assert!(!state.has_loops(needle).unwrap());
}

#[test]
fn test_tuck_accumulates_loops() {
    let mut state = machine();
    state.bring_in(CarrierId::new(2)).unwrap();
    let needle = Needle::back(7);
    state.tuck(needle, &carrier(2)).unwrap();
    state.tuck(needle, &carrier(2)).unwrap();
    assert_eq!(state.at(needle).unwrap().len(), 2);
    assert_eq!(state.drop(needle).unwrap().len(), 2);
    assert_eq!(state.held_loop_count(), 0);
}

// === Transfers and Racking ===

#[test]
fn test_transfer_conserves_loops() {
    let mut state = machine();
    state.bring_in(CarrierId::new(1)).unwrap();
    state.tuck(Needle::front(5), &carrier(1)).unwrap();
    state.tuck(Needle::front(5), &carrier(1)).unwrap();
    let before = state.at(Needle::front(5)).unwrap().to_vec();
    let total = state.held_loop_count();

    state.xfer(Needle::front(5), Needle::back(5)).unwrap();

    assert!(!state.has_loops(Needle::front(5)).unwrap());
    assert_eq!(state.at(Needle::back(5)).unwrap(), before.as_slice());
    assert_eq!(state.held_loop_count(), total);
    for loop_id in before {
        assert_eq!(
            state.get_needle_of_loop(loop_id).unwrap(),
            Some(Needle::back(5))
        );
    }
}

#[test_case(12, 10, 2.0 ; "positive racking")]
#[test_case(10, 12, -2.0 ; "negative racking")]
#[test_case(6, 6, 0.0 ; "aligned")]
fn test_racking_gate(front: usize, back: usize, racking: f64) {
    let mut state = machine();
    state.bring_in(CarrierId::new(1)).unwrap();
    let loops = state.knit(Needle::front(front), &carrier(1)).unwrap();

    state.set_racking(racking + 1.0).unwrap();
    let err = state
        .xfer(Needle::front(front), Needle::back(back))
        .unwrap_err();
    assert_eq!(err.error_code(), "RACKING_MISMATCH");
    assert_eq!(err.kind(), ErrorKind::NeedleLegality);
    assert_eq!(state.at(Needle::front(front)).unwrap(), loops.as_slice());
    assert!(!state.has_loops(Needle::back(back)).unwrap());

    state.update_rack(front, back).unwrap();
    assert_eq!(state.racking(), racking);
    state.xfer(Needle::front(front), Needle::back(back)).unwrap();
    assert_eq!(state.at(Needle::back(back)).unwrap(), loops.as_slice());
}

#[test]
fn test_back_to_front_transfer_uses_same_racking() {
    let mut state = machine();
    state.bring_in(CarrierId::new(1)).unwrap();
    state.knit(Needle::back(8), &carrier(1)).unwrap();
    state.update_rack(11, 8).unwrap();
    let target = state.xfer_needle_at_racking(Needle::back(8), false).unwrap();
    assert_eq!(target, Needle::front(11));
    state.xfer(Needle::back(8), target).unwrap();
    assert!(state.has_loops(Needle::front(11)).unwrap());
}

// === Carriers ===

#[test]
fn test_carrier_round_trip() {
    let mut state = machine();
    let id = CarrierId::new(2);
    state.bring_in(id).unwrap();
    let err = state.bring_in(id).unwrap_err();
    assert_eq!(err.error_code(), "CARRIER_ALREADY_ACTIVE");
    assert_eq!(err.kind(), ErrorKind::CarrierProtocol);

    state.out(id).unwrap();
    assert_eq!(
        state.carriers().carrier(id).unwrap().state(),
        CarrierState::Inactive
    );
    assert_eq!(state.out(id).unwrap_err().error_code(), "CARRIER_NOT_ACTIVE");
}

#[test]
fn test_hook_protocol() {
    let mut state = machine();
    state.inhook(CarrierId::new(1)).unwrap();
    assert_eq!(
        state.inhook(CarrierId::new(2)).unwrap_err().error_code(),
        "HOOK_IN_USE"
    );
    assert_eq!(
        state.releasehook(CarrierId::new(2)).unwrap_err().error_code(),
        "CARRIER_NOT_HOOKED"
    );
    state.releasehook(CarrierId::new(1)).unwrap();
    state.inhook(CarrierId::new(2)).unwrap();
    assert_eq!(state.carriers().hooked_carrier(), Some(CarrierId::new(2)));
}

#[test]
fn test_outhook_cuts_yarn() {
    let mut state = machine();
    let id = CarrierId::new(1);
    state.inhook(id).unwrap();
    state.releasehook(id).unwrap();
    let before = state.knit(Needle::front(1), &carrier(1)).unwrap()[0];
    state.outhook(id).unwrap();
    state.inhook(id).unwrap();
    let after = state.tuck(Needle::front(3), &carrier(1)).unwrap()[0];

    let graph = state.knit_graph();
    let old = graph.get(before).unwrap();
    let new = graph.get(after).unwrap();
    assert_ne!(old.yarn, new.yarn);
    assert_eq!(new.prior_on_yarn, None);
    assert_eq!(graph.yarn_loops(old.yarn), &[before]);
}

#[test]
fn test_unknown_carrier() {
    let mut state = machine();
    assert_eq!(
        state.bring_in(CarrierId::new(5)).unwrap_err().error_code(),
        "UNKNOWN_CARRIER"
    );
    assert_eq!(
        state.bring_in(CarrierId::new(0)).unwrap_err().error_code(),
        "UNKNOWN_CARRIER"
    );
}

// === Gauge ===

#[test_case(1 ; "gauge one")]
#[test_case(2 ; "gauge two")]
#[test_case(4 ; "gauge four")]
#[test_case(5 ; "gauge five")]
#[test_case(10 ; "max gauge")]
fn test_gauge_partition(gauge: usize) {
    let mut state = machine();
    state.set_gauge(gauge).unwrap();
    let count = state.sheet_needle_count(Some(gauge)).unwrap();
    assert_eq!(count * gauge, state.needle_count());
    assert_eq!(count, state.needle_count() / gauge);

    let mut covered = vec![false; state.needle_count()];
    for sheet in 0..gauge {
        for sheet_pos in 0..count {
            let needle = state
                .needle(knit_machine::Side::Front, sheet_pos, Some(sheet), None)
                .unwrap();
            assert!(!covered[needle.position]);
            covered[needle.position] = true;
            assert_eq!(state.sheet_of(needle), sheet);
        }
    }
    assert!(covered.into_iter().all(|c| c));
}

#[test]
fn test_uneven_gauge_rejected() {
    let mut state = machine();
    let err = state.set_gauge(3).unwrap_err();
    assert_eq!(err.error_code(), "UNEVEN_GAUGE");
    assert_eq!(err.kind(), ErrorKind::GaugeSheet);
    assert_eq!(state.gauge(), 1);
}
