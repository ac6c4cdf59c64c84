use std::collections::HashMap;

use lir::*;

#[derive(Debug)]
struct ReplacementState {
    // Offset from rbp, will be negative offset in emitted assembly
    current_offset: i32,
    offset_map: HashMap<String, i32>,
}

/// Assigns every pseudo-register a stack slot sized by its type (quadword
/// slots kept 8-byte aligned); static-storage names become data operands.
pub fn replace_pseudos(prog: &mut Program, symbols: &AsmTable) {
    for func in &mut prog.funcs {
        replace_func(func, symbols);
    }
}

fn replace_func(func: &mut Func, symbols: &AsmTable) {
    let mut state = ReplacementState {
        current_offset: 0,
        offset_map: HashMap::new(),
    };

    for instruction in &mut func.instructions {
        replace_instruction(instruction, &mut state, symbols);
    }

    func.stack_size = -state.current_offset;
}

fn replace_instruction(instruction: &mut Instruction, state: &mut ReplacementState, symbols: &AsmTable) {
    match instruction {
        Instruction::Mov { src, dest, .. }
        | Instruction::Movsx { src, dest }
        | Instruction::MovZeroExtend { src, dest }
        | Instruction::Binary { src, dest, .. }
        | Instruction::Cmp(_, src, dest) => {
            replace_operand(src, state, symbols);
            replace_operand(dest, state, symbols);
        }
        Instruction::Unary { dest, .. } | Instruction::SetCond { dest, .. } => {
            replace_operand(dest, state, symbols);
        }
        Instruction::Idiv(_, op) | Instruction::Div(_, op) | Instruction::Push(op) => {
            replace_operand(op, state, symbols);
        }
        Instruction::Cdq(_)
        | Instruction::Jmp { .. }
        | Instruction::JmpCond { .. }
        | Instruction::Label(_)
        | Instruction::AllocateStack(_)
        | Instruction::DeallocateStack(_)
        | Instruction::Pop(_)
        | Instruction::Call(_)
        | Instruction::Ret => {}
    }
}

fn replace_operand(operand: &mut Operand, state: &mut ReplacementState, symbols: &AsmTable) {
    let var = match operand {
        Operand::Pseudo(var) => var.clone(),
        _ => return,
    };

    if symbols.is_static(&var) {
        *operand = Operand::Data(var);
        return;
    }

    let offset = match state.offset_map.get(&var) {
        Some(offset) => *offset,
        None => {
            let new_offset = match symbols.get_size(&var) {
                8 => (state.current_offset - 8) & !7,
                _ => state.current_offset - 4,
            };
            state.current_offset = new_offset;
            state.offset_map.insert(var, new_offset);
            new_offset
        }
    };

    *operand = Operand::Stack(offset);
}
