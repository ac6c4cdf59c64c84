use std::io::Write;

use ty::{Constant, Type};

use crate::tacky::*;

type IOResult = std::io::Result<()>;

/// Renders the TACKY program in a human-readable form
pub fn debug_tacky<W: Write>(writer: &mut W, program: &TranslationUnit) -> IOResult {
    for var in &program.statics {
        print_static_var(writer, var)?;
    }

    for func in &program.funcs {
        print_func(writer, func)?;
    }

    writer.flush()?;

    Ok(())
}

fn print_static_var<W: Write>(writer: &mut W, var: &StaticVar) -> IOResult {
    let storage = if var.is_static { "static " } else { "" };
    let init = match var.init {
        Some(c) => format_constant(&c),
        None => "<zero>".to_string(),
    };

    writeln!(
        writer,
        "{}{} {} = {}",
        storage,
        format_type(&var.ty),
        var.name,
        init
    )
}

fn print_func<W: Write>(writer: &mut W, func: &Func) -> IOResult {
    writeln!(writer, "{}({}):", func.name, func.params.join(", "))?;

    for instruction in &func.instructions {
        print_instruction(writer, instruction)?;
    }

    Ok(())
}

fn print_instruction<W: Write>(writer: &mut W, instr: &Instruction) -> IOResult {
    match instr {
        Instruction::Return(val) => {
            writeln!(writer, "\tReturn({})", format_val(val))
        }
        Instruction::Unary { op, src, dest } => {
            writeln!(
                writer,
                "\t{} = {}{}",
                format_val(dest),
                format_unary(op),
                format_val(src)
            )
        }
        Instruction::Binary {
            op,
            first,
            second,
            dest,
        } => {
            writeln!(
                writer,
                "\t{} = {} {} {}",
                format_val(dest),
                format_val(first),
                format_binary(op),
                format_val(second)
            )
        }
        Instruction::Copy { src, dest } => {
            writeln!(writer, "\t{} = {}", format_val(dest), format_val(src))
        }
        Instruction::Jump { target } => {
            writeln!(writer, "\tJump({})", target)
        }
        Instruction::JumpIfZero { condition, target } => {
            writeln!(writer, "\tJumpIfZero({}, {})", format_val(condition), target)
        }
        Instruction::JumpIfNotZero { condition, target } => {
            writeln!(
                writer,
                "\tJumpIfNotZero({}, {})",
                format_val(condition),
                target
            )
        }
        Instruction::FunCall {
            func_name,
            args,
            dest,
        } => {
            let args = args.iter().map(format_val).collect::<Vec<_>>().join(", ");

            writeln!(writer, "\t{} = {}({})", format_val(dest), func_name, args)
        }
        Instruction::Label(label) => {
            writeln!(writer, "\n  {}:", label)
        }
    }
}

fn format_type(ty: &Type) -> String {
    match ty {
        Type::Int => "int".to_string(),
        Type::Long => "long".to_string(),
        Type::UInt => "unsigned int".to_string(),
        Type::ULong => "unsigned long".to_string(),
        Type::Func(_) => unreachable!("Internal Error: no object has a function type"),
    }
}

fn format_constant(c: &Constant) -> String {
    match c {
        Constant::Int(i) => format!("{}", i),
        Constant::Long(i) => format!("{}L", i),
        Constant::UInt(i) => format!("{}U", i),
        Constant::ULong(i) => format!("{}UL", i),
    }
}

fn format_val(val: &Val) -> String {
    match val {
        Val::Constant(c) => format_constant(c),
        Val::Var(var) => var.clone(),
    }
}

fn format_unary(op: &UnaryOp) -> String {
    match op {
        UnaryOp::Complement => "~".to_string(),
        UnaryOp::Negate => "-".to_string(),
        UnaryOp::Not => "!".to_string(),
    }
}

fn format_binary(op: &BinaryOp) -> String {
    match op {
        BinaryOp::Add => "+".to_string(),
        BinaryOp::Subtract => "-".to_string(),
        BinaryOp::Multiply => "*".to_string(),
        BinaryOp::Divide => "/".to_string(),
        BinaryOp::DivideUnsigned => "/u".to_string(),
        BinaryOp::Modulo => "%".to_string(),
        BinaryOp::ModuloUnsigned => "%u".to_string(),
        BinaryOp::BitshiftLeft => "<<".to_string(),
        BinaryOp::BitshiftRight => ">>".to_string(),
        BinaryOp::BitshiftRightUnsigned => ">>u".to_string(),
        BinaryOp::BitwiseAnd => "&".to_string(),
        BinaryOp::BitwiseOr => "|".to_string(),
        BinaryOp::BitwiseXor => "^".to_string(),
        BinaryOp::Equal => "==".to_string(),
        BinaryOp::NotEqual => "!=".to_string(),
        BinaryOp::Less => "<".to_string(),
        BinaryOp::LessEqual => "<=".to_string(),
        BinaryOp::Greater => ">".to_string(),
        BinaryOp::GreaterEqual => ">=".to_string(),
        BinaryOp::LessUnsigned => "<u".to_string(),
        BinaryOp::LessEqualUnsigned => "<=u".to_string(),
        BinaryOp::GreaterUnsigned => ">u".to_string(),
        BinaryOp::GreaterEqualUnsigned => ">=u".to_string(),
    }
}
