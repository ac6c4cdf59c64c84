use std::io::Write;

use lir::*;
use ty::Constant;

type IOResult = std::io::Result<()>;

/// Assembly dialect of the host platform. Both are AT&T syntax; they differ
/// in section names, symbol prefixes, and alignment directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Linux,
    MacOs,
}

impl Target {
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Target::MacOs
        } else {
            Target::Linux
        }
    }

    fn symbol(&self, name: &str) -> String {
        match self {
            Target::Linux => name.to_string(),
            Target::MacOs => format!("_{}", name),
        }
    }

    fn data_section(&self) -> &'static str {
        match self {
            Target::Linux => "\t.section .data",
            Target::MacOs => "\t.section __DATA,__data",
        }
    }

    fn text_section(&self) -> &'static str {
        match self {
            Target::Linux => "\t.section .text",
            Target::MacOs => "\t.section __TEXT,__text",
        }
    }

    fn alignment(&self, bytes: i32) -> String {
        match self {
            Target::Linux => format!("\t.align {}", bytes),
            // p2align takes the log2 of the alignment
            Target::MacOs => format!("\t.p2align {}", if bytes == 8 { 3 } else { 2 }),
        }
    }
}

pub fn write_program<W: Write>(
    writer: &mut W,
    assm: &Program,
    symbols: &AsmTable,
    target: Target,
) -> IOResult {
    if !assm.statics.is_empty() {
        writeln!(writer, "{}", target.data_section())?;

        for var in &assm.statics {
            emit_static_var(writer, var, target)?;
        }
    }

    writeln!(writer, "{}", target.text_section())?;

    for func in &assm.funcs {
        emit_func(writer, func, symbols, target)?;
    }

    if target == Target::Linux {
        writeln!(writer, ".section .note.GNU-stack,\"\",@progbits")?;
    }

    writer.flush()?;

    Ok(())
}

fn emit_static_var<W: Write>(writer: &mut W, var: &StaticVar, target: Target) -> IOResult {
    let name = target.symbol(&var.name);

    if var.global {
        writeln!(writer, "\t.globl {}", name)?;
    }

    writeln!(writer, "{}", target.alignment(var.alignment))?;
    writeln!(writer, "{}:", name)?;

    match var.init {
        Constant::Int(i) => writeln!(writer, "\t.long {}", i)?,
        Constant::UInt(i) => writeln!(writer, "\t.long {}", i)?,
        Constant::Long(i) => writeln!(writer, "\t.quad {}", i)?,
        Constant::ULong(i) => writeln!(writer, "\t.quad {}", i)?,
    }

    Ok(())
}

fn emit_func<W: Write>(
    writer: &mut W,
    func: &Func,
    symbols: &AsmTable,
    target: Target,
) -> IOResult {
    let name = target.symbol(&func.name);

    if func.global {
        writeln!(writer, "\t.globl {}", name)?;
    }
    writeln!(writer, "{}:", name)?;

    for instruction in &func.instructions {
        emit_instruction(writer, instruction, symbols, target)?;
    }

    Ok(())
}

fn emit_instruction<W: Write>(
    writer: &mut W,
    instruction: &Instruction,
    symbols: &AsmTable,
    target: Target,
) -> IOResult {
    match instruction {
        Instruction::Mov { ty, src, dest } => writeln!(
            writer,
            "\tmov{} {}, {}",
            show_type(ty),
            show_operand(src, *ty, target),
            show_operand(dest, *ty, target)
        )?,
        Instruction::Movsx { src, dest } => {
            writeln!(
                writer,
                "\tmovslq {}, {}",
                show_operand(src, AssemblyType::Long, target),
                show_operand(dest, AssemblyType::Quad, target)
            )?;
        }
        Instruction::MovZeroExtend { .. } => {
            panic!("Internal Error: zero-extension must be rewritten before emission")
        }
        Instruction::Ret => {
            writeln!(writer, "\tret")?;
        }
        Instruction::Unary { op, ty, dest } => {
            writeln!(
                writer,
                "\t{}{} {}",
                show_unary(op),
                show_type(ty),
                show_operand(dest, *ty, target)
            )?;
        }
        Instruction::Binary {
            op: op @ (BinaryOp::Sal | BinaryOp::Sar | BinaryOp::Shr),
            ty,
            src,
            dest,
        } => {
            writeln!(
                writer,
                "\t{}{} {}, {}",
                show_binary(op),
                show_type(ty),
                show_byte_operand(src, target),
                show_operand(dest, *ty, target)
            )?;
        }
        Instruction::Binary { op, ty, src, dest } => {
            writeln!(
                writer,
                "\t{}{} {}, {}",
                show_binary(op),
                show_type(ty),
                show_operand(src, *ty, target),
                show_operand(dest, *ty, target)
            )?;
        }
        Instruction::Cmp(ty, first, second) => {
            writeln!(
                writer,
                "\tcmp{} {}, {}",
                show_type(ty),
                show_operand(first, *ty, target),
                show_operand(second, *ty, target)
            )?;
        }
        Instruction::Idiv(ty, op) => {
            writeln!(
                writer,
                "\tidiv{} {}",
                show_type(ty),
                show_operand(op, *ty, target)
            )?;
        }
        Instruction::Div(ty, op) => {
            writeln!(
                writer,
                "\tdiv{} {}",
                show_type(ty),
                show_operand(op, *ty, target)
            )?;
        }
        Instruction::Cdq(AssemblyType::Long) => {
            writeln!(writer, "\tcdq")?;
        }
        Instruction::Cdq(AssemblyType::Quad) => {
            writeln!(writer, "\tcqo")?;
        }
        Instruction::Jmp { label } => {
            writeln!(writer, "\tjmp {}", label)?;
        }
        Instruction::JmpCond { condition, label } => {
            writeln!(writer, "\tj{} {}", show_condition(condition), label)?;
        }
        Instruction::SetCond { condition, dest } => {
            writeln!(
                writer,
                "\tset{} {}",
                show_condition(condition),
                show_byte_operand(dest, target)
            )?;
        }
        Instruction::Label(label) => {
            writeln!(writer, "{}:", label)?;
        }
        Instruction::AllocateStack(amt) => {
            writeln!(writer, "\tsubq ${}, %rsp", amt)?;
        }
        Instruction::DeallocateStack(amt) => {
            writeln!(writer, "\taddq ${}, %rsp", amt)?;
        }
        Instruction::Push(op) => {
            writeln!(
                writer,
                "\tpushq {}",
                show_operand(op, AssemblyType::Quad, target)
            )?;
        }
        Instruction::Pop(register) => {
            writeln!(writer, "\tpopq {}", show_quad_reg(register))?;
        }
        Instruction::Call(func) => {
            writeln!(writer, "\tcall {}", show_fun_name(func, symbols, target))?;
        }
    }

    Ok(())
}

fn show_type(ty: &AssemblyType) -> &'static str {
    match ty {
        AssemblyType::Long => "l",
        AssemblyType::Quad => "q",
    }
}

fn show_fun_name(name: &str, symbols: &AsmTable, target: Target) -> String {
    match target {
        Target::MacOs => target.symbol(name),
        Target::Linux => {
            if symbols.is_defined_func(name) {
                name.to_string()
            } else {
                format!("{}@PLT", name)
            }
        }
    }
}

fn show_unary(op: &UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "neg",
        UnaryOp::Not => "not",
    }
}

fn show_binary(op: &BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mult => "imul",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Xor => "xor",
        BinaryOp::Sal => "sal",
        BinaryOp::Sar => "sar",
        BinaryOp::Shr => "shr",
    }
}

fn show_byte_reg(reg: &Register) -> &'static str {
    match reg {
        Register::AX => "%al",
        Register::CX => "%cl",
        Register::DX => "%dl",
        Register::DI => "%dil",
        Register::SI => "%sil",
        Register::R8 => "%r8b",
        Register::R9 => "%r9b",
        Register::R10 => "%r10b",
        Register::R11 => "%r11b",
        Register::SP | Register::BP => {
            unreachable!("Internal Error: no byte-size stack registers")
        }
    }
}

fn show_reg(reg: &Register) -> &'static str {
    match reg {
        Register::AX => "%eax",
        Register::CX => "%ecx",
        Register::DX => "%edx",
        Register::DI => "%edi",
        Register::SI => "%esi",
        Register::R8 => "%r8d",
        Register::R9 => "%r9d",
        Register::R10 => "%r10d",
        Register::R11 => "%r11d",
        Register::SP | Register::BP => {
            unreachable!("Internal Error: no 32-bit stack registers")
        }
    }
}

fn show_quad_reg(reg: &Register) -> &'static str {
    match reg {
        Register::AX => "%rax",
        Register::CX => "%rcx",
        Register::DX => "%rdx",
        Register::DI => "%rdi",
        Register::SI => "%rsi",
        Register::R8 => "%r8",
        Register::R9 => "%r9",
        Register::R10 => "%r10",
        Register::R11 => "%r11",
        Register::SP => "%rsp",
        Register::BP => "%rbp",
    }
}

fn show_byte_operand(op: &Operand, target: Target) -> String {
    match op {
        Operand::Register(reg) => show_byte_reg(reg).to_string(),
        _ => show_operand(op, AssemblyType::Long, target),
    }
}

fn show_operand(op: &Operand, ty: AssemblyType, target: Target) -> String {
    match op {
        Operand::Register(reg) => match ty {
            AssemblyType::Long => show_reg(reg).to_string(),
            AssemblyType::Quad => show_quad_reg(reg).to_string(),
        },
        Operand::Stack(amt) => format!("{}(%rbp)", amt),
        Operand::Imm(val) => format!("${}", val),
        Operand::Data(var) => format!("{}(%rip)", target.symbol(var)),
        Operand::Pseudo(_) => {
            panic!("Internal Error: no pseudo-registers should remain at emission")
        }
    }
}

fn show_condition(cond: &Condition) -> &'static str {
    match cond {
        Condition::E => "e",
        Condition::NE => "ne",
        Condition::G => "g",
        Condition::GE => "ge",
        Condition::L => "l",
        Condition::LE => "le",
        Condition::A => "a",
        Condition::AE => "ae",
        Condition::B => "b",
        Condition::BE => "be",
    }
}
