//! Runs a small program one microstep at a time, printing each datapath
//! event the way the instruction panel would show it.

use mips_core::{Fault, Machine, StepOutcome, TraceEvent, TraceSink};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

struct StdoutTrace;

impl TraceSink for StdoutTrace {
    fn on_event(&mut self, event: TraceEvent) {
        println!("    {event}");
    }
}

fn main() -> Result<(), Fault> {
    // addi $t0, $zero, 5
    // addi $t1, $t0, 3
    // sw   $t1, -4($sp)
    let program = "\
0x0: 00100000 00001000 00000000 00000101
0x4: 00100001 00001001 00000000 00000011
0x8: 10101111 10101001 11111111 11111100
";

    let mut machine = Machine::with_memory_size(256);
    machine.load_program(program)?;

    let mut trace = StdoutTrace;
    loop {
        println!("PC = {}", machine.pc());
        if machine.run_instruction(&mut trace)? == StepOutcome::Exhausted {
            break;
        }
    }

    println!("$t1 = {}", machine.registers().gpr(mips_core::Register::from_field(9)));
    println!("stack word = {:?}", machine.memory().stack_segment());
    Ok(())
}
