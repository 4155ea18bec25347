//! The console's command set.

use super::{
    format,
    parse::{
        parse_address, parse_breakpoint_type, parse_byte, parse_count, parse_integer,
        parse_register,
    },
    Args, BuildError, CommandTable, Context, TableBuilder,
};
use crate::{
    error::{Error, Result},
    x86::{dec, Breakpoint, BreakpointType},
};

const DEFAULT_ASM_LINES: i32 = 10;
const DEFAULT_DUMP_BYTES: i32 = 64;

pub fn table() -> std::result::Result<CommandTable, BuildError> {
    TableBuilder::new()
        .command(&["help", "?"], "Show help", help)
        .command(&["clear", "cls"], "Clear the output", clear)
        .command(&["exit", "quit"], "Leave the debugger", exit)
        .command(
            &["Connect", "!"],
            "Register for 'breakpoint hit' notifications",
            connect,
        )
        .command(&["Continue", "g"], "Resume execution", resume)
        .command(&["Break", "b"], "Pause execution", pause)
        .command(
            &["StepOver", "p"],
            "Steps to the next instruction, running over calls, interrupts, loops and rep",
            step_over,
        )
        .command(
            &["StepIn", "n"],
            "Steps to the next instruction, including into function calls etc",
            step_in,
        )
        .command(
            &["StepMultiple", "gn"],
            "<count> - Runs the CPU for the given number of cycles",
            step_multiple,
        )
        .command(
            &["RunToAddress", "ga"],
            "<address> - Run until the given address is reached",
            run_to_address,
        )
        .command(&["GetState", "r"], "Get the current CPU state", state)
        .command(
            &["Disassemble", "u"],
            "[address] [count] - Disassemble instructions at the given address",
            disassemble,
        )
        .command(
            &["GetMemory", "d"],
            "<address> [length] - Gets the contents of memory at the given address",
            memory,
        )
        .command(
            &["SetMemory", "e"],
            "<address> <byte>... - Changes the contents of memory at the given address",
            set_memory,
        )
        .command(
            &["SearchMemory", "s"],
            "<address> <length|-1> <byte>... - Finds a byte pattern in memory",
            search_memory,
        )
        .command(
            &["ListBreakpoints", "bps", "bl"],
            "Retrieves the current breakpoint list",
            breakpoints,
        )
        .command(
            &["SetBreakpoint", "bp"],
            "<address> [type] [ah] [al] - Sets or updates a breakpoint",
            set_breakpoint,
        )
        .command(
            &["DelBreakpoint", "bd"],
            "<address> - Removes the breakpoint at the given address",
            del_breakpoint,
        )
        .command(
            &["SetReg", "reg"],
            "<register> <value> - Updates the contents of a CPU register",
            set_register,
        )
        .command(&["Gdt"], "Lists the global descriptor table", gdt)
        .command(&["Ldt"], "Lists the local descriptor table", ldt)
        .build()
}

fn help(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    ctx.print(ctx.commands.help());
    Ok(())
}

fn clear(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    ctx.out.clear();
    Ok(())
}

fn exit(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    ctx.exit = true;
    Ok(())
}

fn connect(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    ctx.host.connect()
}

fn resume(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    ctx.host.run()
}

fn pause(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let regs = ctx.host.pause()?;
    ctx.show_registers(regs);
    Ok(())
}

fn step_over(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let ip = ctx.host.state()?.ip();
    let bitness = dec::code_bitness(ctx.host, ip.selector(), ctx.session.bitness())?;

    match dec::fetch_step_over_target(ctx.host, ip, bitness)? {
        Some(next) => {
            ctx.host.run_to_address(next)?;
            ctx.out.info(&format!("Running to {next}"));
        }
        None => {
            let regs = ctx.host.step_in()?;
            ctx.show_registers(regs);
        }
    }

    Ok(())
}

fn step_in(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let regs = ctx.host.step_in()?;
    ctx.show_registers(regs);
    Ok(())
}

fn step_multiple(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let count = parse_count(args.next_arg())?;
    let regs = ctx.host.step_multiple(count)?;
    ctx.show_registers(regs);
    Ok(())
}

fn run_to_address(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let addr = parse_address(args.next_arg(), ctx.session, true)?;
    ctx.host.run_to_address(addr)
}

fn state(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let regs = ctx.host.state()?;
    ctx.show_registers(regs);
    Ok(())
}

fn disassemble(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let addr = match args.next_arg() {
        "" => {
            if !ctx.session.has_state() {
                let regs = ctx.host.state()?;
                ctx.session.update(regs);
            }
            ctx.session.regs().ip()
        }
        s => parse_address(s, ctx.session, true)?,
    };
    let count = match args.next_arg() {
        "" => DEFAULT_ASM_LINES,
        s => parse_count(s)?,
    };

    let lines = ctx.host.disassemble(addr, count)?;
    ctx.print(format::disassembly(&lines));
    Ok(())
}

fn memory(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let addr = parse_address(args.next_arg(), ctx.session, false)?;
    let length = match args.next_arg() {
        "" => DEFAULT_DUMP_BYTES,
        s => parse_count(s)?,
    };

    let bytes = ctx.host.memory(addr, length)?;
    ctx.print(format::memory(addr, &bytes));
    Ok(())
}

fn byte_list(args: &mut Args<'_>) -> Result<Vec<u8>> {
    let bytes = args
        .rest()
        .into_iter()
        .map(parse_byte)
        .collect::<Result<Vec<_>>>()?;

    if bytes.is_empty() {
        return Err(Error::format("Expected at least one byte"));
    }

    Ok(bytes)
}

fn set_memory(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let addr = parse_address(args.next_arg(), ctx.session, false)?;
    let bytes = byte_list(args)?;

    ctx.host.set_memory(addr, &bytes)
}

fn search_memory(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let start = parse_address(args.next_arg(), ctx.session, false)?;
    let s = args.next_arg();
    let length = parse_integer(s)?;
    if length < -1 {
        return Err(Error::format(format!("Invalid length \"{s}\"")));
    }
    let pattern = byte_list(args)?;

    let found = ctx.host.search_memory(start, length, &pattern, 0)?;
    if found.is_empty() {
        ctx.out.info("Not found");
    } else {
        ctx.print(found.iter().map(ToString::to_string));
    }

    Ok(())
}

fn breakpoints(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let bps = ctx.host.breakpoints()?;
    ctx.print(format::breakpoints(&bps));
    Ok(())
}

fn set_breakpoint(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let address = parse_address(args.next_arg(), ctx.session, true)?;
    let kind = match args.next_arg() {
        "" => BreakpointType::Normal,
        s => parse_breakpoint_type(s)?,
    };
    let ah = match args.next_arg() {
        "" => 0,
        s => parse_byte(s)?,
    };
    let al = match args.next_arg() {
        "" => 0,
        s => parse_byte(s)?,
    };

    ctx.host.set_breakpoint(Breakpoint {
        address,
        kind,
        ah,
        al,
    })
}

fn del_breakpoint(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let addr = parse_address(args.next_arg(), ctx.session, true)?;
    ctx.host.del_breakpoint(addr)
}

fn set_register(args: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let reg = parse_register(args.next_arg())?;
    let value = parse_integer(args.next_arg())?;
    ctx.host.set_register(reg, value)
}

fn gdt(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let descs = ctx.host.gdt()?;
    ctx.print(format::descriptors(&descs, false));
    Ok(())
}

fn ldt(_: &mut Args<'_>, ctx: &mut Context<'_>) -> Result<()> {
    let descs = ctx.host.ldt()?;
    ctx.print(format::descriptors(&descs, true));
    Ok(())
}
