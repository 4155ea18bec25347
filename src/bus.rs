use std::thread::{self, JoinHandle};
use tracing::{debug, warn};
use zbus::{blocking::Connection, dbus_proxy, Result};

use crate::{
    error,
    host::Host,
    x86::{cpu::Registers, desc::Descriptor, Address, AssemblyLine, Breakpoint, Register},
};

#[dbus_proxy(
    interface = "com.dosbox.Debugger",
    default_service = "com.dosbox",
    default_path = "/debugger"
)]
trait DebugHost {
    #[dbus_proxy(name = "Connect")]
    fn connect(&self) -> Result<()>;

    #[dbus_proxy(name = "Continue")]
    fn run(&self) -> Result<()>;

    #[dbus_proxy(name = "Break")]
    fn pause(&self) -> Result<Registers>;

    #[dbus_proxy(name = "StepIn")]
    fn step_in(&self) -> Result<Registers>;

    #[dbus_proxy(name = "StepMultiple")]
    fn step_multiple(&self, count: i32) -> Result<Registers>;

    #[dbus_proxy(name = "RunToAddress")]
    fn run_to_address(&self, address: &Address) -> Result<()>;

    #[dbus_proxy(name = "GetState")]
    fn state(&self) -> Result<Registers>;

    #[dbus_proxy(name = "Disassemble")]
    fn disassemble(&self, address: &Address, length: i32) -> Result<Vec<AssemblyLine>>;

    #[dbus_proxy(name = "GetMemory")]
    fn memory(&self, address: &Address, length: i32) -> Result<Vec<u8>>;

    #[dbus_proxy(name = "SetMemory")]
    fn set_memory(&self, address: &Address, bytes: &[u8]) -> Result<()>;

    #[dbus_proxy(name = "SearchMemory")]
    fn search_memory(
        &self,
        start: &Address,
        length: i32,
        pattern: &[u8],
        advance: i32,
    ) -> Result<Vec<Address>>;

    #[dbus_proxy(name = "ListBreakpoints")]
    fn breakpoints(&self) -> Result<Vec<Breakpoint>>;

    #[dbus_proxy(name = "SetBreakpoint")]
    fn set_breakpoint(&self, breakpoint: &Breakpoint) -> Result<()>;

    #[dbus_proxy(name = "DelBreakpoint")]
    fn del_breakpoint(&self, address: &Address) -> Result<()>;

    #[dbus_proxy(name = "SetReg")]
    fn set_register(&self, reg: Register, value: i32) -> Result<()>;

    #[dbus_proxy(name = "GetGdt")]
    fn gdt(&self) -> Result<Vec<Descriptor>>;

    #[dbus_proxy(name = "GetLdt")]
    fn ldt(&self) -> Result<Vec<Descriptor>>;

    #[dbus_proxy(signal, name = "Stopped")]
    fn stopped(&self, state: Registers) -> Result<()>;
}

pub fn proxy(conn: &Connection, service: &str) -> Result<DebugHostProxyBlocking<'static>> {
    DebugHostProxyBlocking::builder(conn)
        .destination(service.to_owned())?
        .build()
}

impl Host for DebugHostProxyBlocking<'_> {
    fn connect(&self) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::connect(self)?)
    }

    fn run(&self) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::run(self)?)
    }

    fn pause(&self) -> error::Result<Registers> {
        Ok(DebugHostProxyBlocking::pause(self)?)
    }

    fn step_in(&self) -> error::Result<Registers> {
        Ok(DebugHostProxyBlocking::step_in(self)?)
    }

    fn step_multiple(&self, count: i32) -> error::Result<Registers> {
        Ok(DebugHostProxyBlocking::step_multiple(self, count)?)
    }

    fn run_to_address(&self, address: Address) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::run_to_address(self, &address)?)
    }

    fn state(&self) -> error::Result<Registers> {
        Ok(DebugHostProxyBlocking::state(self)?)
    }

    fn disassemble(&self, address: Address, count: i32) -> error::Result<Vec<AssemblyLine>> {
        Ok(DebugHostProxyBlocking::disassemble(self, &address, count)?)
    }

    fn memory(&self, address: Address, length: i32) -> error::Result<Vec<u8>> {
        Ok(DebugHostProxyBlocking::memory(self, &address, length)?)
    }

    fn set_memory(&self, address: Address, bytes: &[u8]) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::set_memory(self, &address, bytes)?)
    }

    fn search_memory(
        &self,
        start: Address,
        length: i32,
        pattern: &[u8],
        advance: i32,
    ) -> error::Result<Vec<Address>> {
        Ok(DebugHostProxyBlocking::search_memory(
            self, &start, length, pattern, advance,
        )?)
    }

    fn breakpoints(&self) -> error::Result<Vec<Breakpoint>> {
        Ok(DebugHostProxyBlocking::breakpoints(self)?)
    }

    fn set_breakpoint(&self, breakpoint: Breakpoint) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::set_breakpoint(self, &breakpoint)?)
    }

    fn del_breakpoint(&self, address: Address) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::del_breakpoint(self, &address)?)
    }

    fn set_register(&self, reg: Register, value: i32) -> error::Result<()> {
        Ok(DebugHostProxyBlocking::set_register(self, reg, value)?)
    }

    fn gdt(&self) -> error::Result<Vec<Descriptor>> {
        Ok(DebugHostProxyBlocking::gdt(self)?)
    }

    fn ldt(&self) -> error::Result<Vec<Descriptor>> {
        Ok(DebugHostProxyBlocking::ldt(self)?)
    }
}

/// Delivers `Stopped` signals to `on_stopped` from a dedicated thread, so the command loop never
/// waits on them.
pub fn listen_stopped<F>(proxy: DebugHostProxyBlocking<'static>, on_stopped: F) -> Result<JoinHandle<()>>
where
    F: Fn(Registers) + Send + 'static,
{
    let signals = proxy.receive_stopped()?;

    Ok(thread::spawn(move || {
        for signal in signals {
            match signal.args() {
                Ok(args) => {
                    let state = *args.state();
                    debug!(cs = state.cs, eip = state.eip, "host stopped");
                    on_stopped(state);
                }
                Err(e) => warn!("malformed Stopped signal: {e}"),
            }
        }

        debug!("stop notifications ended");
    }))
}
