use crate::{
    error::Result,
    x86::{cpu::Registers, desc::Descriptor, Address, AssemblyLine, Breakpoint, Register},
};

/// Request/response side of the debug host. Every call blocks until the host replies.
pub trait Host {
    /// Asks the host to start sending `Stopped` notifications to this client.
    fn connect(&self) -> Result<()>;
    fn run(&self) -> Result<()>;
    fn pause(&self) -> Result<Registers>;
    fn step_in(&self) -> Result<Registers>;
    fn step_multiple(&self, count: i32) -> Result<Registers>;
    fn run_to_address(&self, address: Address) -> Result<()>;
    fn state(&self) -> Result<Registers>;
    fn disassemble(&self, address: Address, count: i32) -> Result<Vec<AssemblyLine>>;
    fn memory(&self, address: Address, length: i32) -> Result<Vec<u8>>;
    fn set_memory(&self, address: Address, bytes: &[u8]) -> Result<()>;
    fn search_memory(
        &self,
        start: Address,
        length: i32,
        pattern: &[u8],
        advance: i32,
    ) -> Result<Vec<Address>>;
    fn breakpoints(&self) -> Result<Vec<Breakpoint>>;
    fn set_breakpoint(&self, breakpoint: Breakpoint) -> Result<()>;
    fn del_breakpoint(&self, address: Address) -> Result<()>;
    fn set_register(&self, reg: Register, value: i32) -> Result<()>;
    fn gdt(&self) -> Result<Vec<Descriptor>>;
    fn ldt(&self) -> Result<Vec<Descriptor>>;
}
