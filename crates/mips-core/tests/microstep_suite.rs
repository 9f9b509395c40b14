//! Microstep chain lengths, trace wording, and commit timing.

use mips_core::{
    decode, microstep_count, Decoded, Fault, Machine, NullTrace, RecordingTrace, Register,
    StepOutcome, TraceEvent,
};
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const fn r_type(rs: u32, rt: u32, rd: u32, funct: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | funct
}

const fn i_type(opcode: u32, rs: u32, rt: u32, imm: u32) -> u32 {
    (opcode << 26) | (rs << 21) | (rt << 16) | (imm & 0xFFFF)
}

fn machine_with_word(word: u32) -> Machine {
    let mut machine = Machine::with_memory_size(256);
    machine.write_memory_word(0, word).expect("word fits");
    machine
}

/// Drives one instruction and returns how many microstep calls it took.
fn count_microsteps(machine: &mut Machine) -> u32 {
    let mut calls = 0;
    loop {
        calls += 1;
        match machine.run_microstep(&mut NullTrace).expect("no fault") {
            StepOutcome::Progressed => {}
            StepOutcome::Retired => return calls,
            StepOutcome::Exhausted => panic!("hit the zero word before retiring"),
        }
    }
}

#[rstest]
#[case::add(r_type(8, 9, 10, 0b10_0000), 6)]
#[case::sub(r_type(8, 9, 10, 0b10_0010), 6)]
#[case::and(r_type(8, 9, 10, 0b10_0100), 6)]
#[case::or(r_type(8, 9, 10, 0b10_0101), 6)]
#[case::xor(r_type(8, 9, 10, 0b10_0110), 6)]
#[case::slt(r_type(8, 9, 10, 0b10_1010), 6)]
#[case::mul(r_type(8, 9, 0, 0b01_1000), 7)]
#[case::not(r_type(8, 0, 10, 0b10_0111), 4)]
#[case::addi(i_type(0b00_1000, 0, 8, 5), 6)]
#[case::andi(i_type(0b00_1100, 0, 8, 5), 6)]
#[case::ori(i_type(0b00_1101, 0, 8, 5), 6)]
#[case::slti(i_type(0b00_1010, 0, 8, 5), 5)]
#[case::lw(i_type(0b10_0011, 0, 8, 32), 3)]
#[case::sw(i_type(0b10_1011, 0, 8, 32), 3)]
#[case::beq_taken(i_type(0b00_0100, 0, 0, 4), 5)]
#[case::bne_untaken(i_type(0b00_0101, 0, 0, 4), 5)]
#[case::blez(i_type(0b00_0110, 8, 0, 4), 5)]
#[case::bgtz(i_type(0b00_0001, 8, 0, 4), 5)]
#[case::j((0b00_0010 << 26) | 8, 1)]
#[case::jal((0b00_0011 << 26) | 8, 2)]
fn every_instruction_takes_its_fixed_microstep_count(#[case] word: u32, #[case] expected: u32) {
    let Ok(Decoded::Instruction(instruction)) = decode(word) else {
        panic!("case word should decode");
    };
    assert_eq!(u32::from(microstep_count(&instruction)), expected);

    let mut machine = machine_with_word(word);
    assert_eq!(count_microsteps(&mut machine), expected);
}

#[test]
fn addi_trace_matches_the_datapath_wording() {
    let mut machine = machine_with_word(i_type(0b00_1000, 0, 8, 5));
    let mut trace = RecordingTrace::new();
    machine.run_instruction(&mut trace).expect("no fault");

    assert_eq!(
        trace.rendered(),
        vec![
            "Sending 0 to ALU".to_owned(),
            "Sending 5 to ALU".to_owned(),
            "Sending \"add\" to ALU".to_owned(),
            "Retrieved 5 from ALU".to_owned(),
            "Placing 5 in register 8".to_owned(),
            "Increasing PC by 4".to_owned(),
        ]
    );
}

#[test]
fn mul_trace_places_hi_before_lo() {
    let mut machine = machine_with_word(r_type(8, 9, 0, 0b01_1000));
    machine.set_register(Register::T0, -1);
    machine.set_register(Register::from_field(9), 1);

    let mut trace = RecordingTrace::new();
    machine.run_instruction(&mut trace).expect("no fault");

    assert_eq!(trace.events[3], TraceEvent::AluResult { value: -1 });
    assert_eq!(trace.events[4], TraceEvent::PlaceHi { value: -1 });
    assert_eq!(trace.events[5], TraceEvent::PlaceLo { value: -1 });
    assert_eq!(trace.rendered()[4], "Placing -1 in HI");
}

#[test]
fn store_commits_exactly_on_its_memory_microstep() {
    // sw $t0, 32($zero)
    let mut machine = machine_with_word(i_type(0b10_1011, 0, 8, 32));
    machine.set_register(Register::T0, 7);

    let mut trace = RecordingTrace::new();
    machine.run_microstep(&mut trace).expect("address step");
    assert_eq!(machine.memory().as_bytes()[32..36], [0, 0, 0, 0]);

    machine.run_microstep(&mut trace).expect("memory step");
    assert_eq!(machine.memory().as_bytes()[32..36], [0, 0, 0, 7]);
    assert_eq!(machine.pc(), 0, "not yet retired");

    assert_eq!(
        machine.run_microstep(&mut trace).expect("retire step"),
        StepOutcome::Retired
    );
    assert_eq!(machine.pc(), 4);
}

#[test]
fn load_fault_resets_the_chain_for_a_clean_retry() {
    // lw $t0, 0($t1) with $t1 pointing past the end of memory.
    let mut machine = machine_with_word(i_type(0b10_0011, 9, 8, 0));
    machine.set_register(Register::from_field(9), 300);

    let mut trace = RecordingTrace::new();
    assert_eq!(
        machine.run_microstep(&mut trace).expect("address step"),
        StepOutcome::Progressed
    );
    let fault = machine
        .run_microstep(&mut trace)
        .expect_err("read step faults");
    assert!(matches!(fault, Fault::MemoryOutOfBounds { addr: 300, .. }));
    assert_eq!(machine.registers().gpr(Register::T0), 0);

    // The next call starts the instruction over from the address step.
    machine.set_register(Register::from_field(9), 32);
    let mut retry = RecordingTrace::new();
    machine.run_instruction(&mut retry).expect("now in bounds");
    assert_eq!(retry.events.len(), 3);
    assert!(matches!(retry.events[0], TraceEvent::SendAddress { addr: 32 }));
}

#[test]
fn zero_word_reports_exhaustion_without_events() {
    let mut machine = Machine::with_memory_size(64);
    let mut trace = RecordingTrace::new();
    assert_eq!(
        machine.run_microstep(&mut trace).expect("no fault"),
        StepOutcome::Exhausted
    );
    assert!(trace.events.is_empty());
    assert_eq!(machine.pc(), 0, "exhaustion does not move the PC");

    // Exhaustion is repeatable, not latched.
    assert_eq!(
        machine.run_instruction(&mut trace).expect("no fault"),
        StepOutcome::Exhausted
    );
}
