use std::collections::BTreeMap;

use crate::exception::Snapshot;
use crate::memory::{Memory, register_address};
use crate::sfr::{PSW_AC, PSW_C, PSW_F0, PSW_OV, SFR_B, SFR_DPH, SFR_DPL};

use tracing::{Level, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Log a message to the console.
    Log(String),
    /// Enable or disable tracing of every executed instruction.
    SetTraceInstructions(bool),
    /// Trace the current state of the CPU.
    TraceRegisters,
}

impl Action {
    fn run(&self, trace_instructions: &mut bool, memory: &Memory, state: &Snapshot) {
        match self {
            Self::Log(message) => info!("[BP {:04X}] {}", state.pc, message),
            Self::SetTraceInstructions(value) => *trace_instructions = *value,
            Self::TraceRegisters => {
                if tracing::enabled!(Level::INFO) {
                    trace_registers(memory, state);
                }
            }
        }
    }
}

fn trace_registers(memory: &Memory, state: &Snapshot) {
    let sfr = memory.sfr();
    let flag = |bit: u8| (state.psw >> bit) & 1;
    info!(
        "  A={:02X}  B={:02X}  DPTR={:04X}  SP={:02X}  C={} OV={} AC={} F0={}",
        state.a,
        sfr.get(SFR_B),
        u16::from_be_bytes([sfr.get(SFR_DPH), sfr.get(SFR_DPL)]),
        state.sp,
        flag(PSW_C),
        flag(PSW_OV),
        flag(PSW_AC),
        flag(PSW_F0),
    );

    let mut regs = String::from(" ");
    for i in 0..8 {
        if let Ok(addr) = register_address(state.psw, i) {
            regs.push_str(&format!(" R{}={:02X}", i, memory.lower()[addr as usize]));
        }
    }
    info!("{}", regs);
}

/// Addresses that raise a breakpoint exception before the instruction there
/// executes, each with an optional list of actions.
#[derive(Debug, Default)]
pub struct Breakpoints {
    points: BTreeMap<u16, Vec<Action>>,
    trace_instructions: bool,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a breakpoint with no actions. Existing actions are kept.
    pub fn insert(&mut self, addr: u16) {
        self.points.entry(addr).or_default();
    }

    pub fn add(&mut self, addr: u16, action: Action) {
        self.points.entry(addr).or_default().push(action);
    }

    pub fn remove(&mut self, addr: u16) {
        self.points.remove(&addr);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn contains(&self, addr: u16) -> bool {
        self.points.contains_key(&addr)
    }

    pub fn addresses(&self) -> impl Iterator<Item = u16> + '_ {
        self.points.keys().copied()
    }

    pub fn trace_instructions(&self) -> bool {
        self.trace_instructions
    }

    pub fn set_trace_instructions(&mut self, value: bool) {
        self.trace_instructions = value;
    }

    pub(crate) fn run(&mut self, memory: &Memory, state: &Snapshot) {
        let Some(actions) = self.points.get(&state.pc) else {
            return;
        };
        for action in actions {
            action.run(&mut self.trace_instructions, memory, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Variant;

    fn state(pc: u16) -> Snapshot {
        Snapshot {
            pc,
            a: 0x12,
            psw: 0x08,
            sp: 0x07,
            cycles: 4,
        }
    }

    #[test]
    fn insert_and_remove() {
        let mut breakpoints = Breakpoints::new();
        breakpoints.insert(0x0100);
        breakpoints.add(0x0040, Action::Log("hello".into()));
        assert!(breakpoints.contains(0x0100));
        assert_eq!(breakpoints.addresses().collect::<Vec<_>>(), vec![0x0040, 0x0100]);

        breakpoints.remove(0x0100);
        assert!(!breakpoints.contains(0x0100));
        breakpoints.clear();
        assert!(!breakpoints.contains(0x0040));
    }

    #[test]
    fn insert_keeps_existing_actions() {
        let mut breakpoints = Breakpoints::new();
        breakpoints.add(0x10, Action::SetTraceInstructions(true));
        breakpoints.insert(0x10);
        let memory = Memory::new(Variant::Ch552);
        breakpoints.run(&memory, &state(0x10));
        assert!(breakpoints.trace_instructions());
    }

    #[test]
    fn actions_only_run_at_their_address() {
        let mut breakpoints = Breakpoints::new();
        breakpoints.add(0x20, Action::SetTraceInstructions(true));
        breakpoints.add(0x30, Action::TraceRegisters);
        breakpoints.add(0x30, Action::SetTraceInstructions(false));
        let memory = Memory::new(Variant::Ch552);

        breakpoints.run(&memory, &state(0x30));
        assert!(!breakpoints.trace_instructions());
        breakpoints.run(&memory, &state(0x20));
        assert!(breakpoints.trace_instructions());
        breakpoints.run(&memory, &state(0x30));
        assert!(!breakpoints.trace_instructions());
    }
}
