use lir::*;

/// Inserts the prologue, expands `ret` into the matching epilogue, and
/// rewrites instructions whose operand classes the ISA does not accept.
///
/// Scratch conventions: `%r10` carries rewritten sources and large
/// immediates, `%r11` rewritten destinations, so the two never collide.
pub fn fix_invalid_instructions(prog: &mut Program) {
    for func in &mut prog.funcs {
        fix_func(func);
    }
}

fn round_up_16(bytes: i32) -> i32 {
    (bytes + 15) / 16 * 16
}

fn fix_func(func: &mut Func) {
    let mut fixed = vec![
        Instruction::Push(Operand::Register(Register::BP)),
        Instruction::Mov {
            ty: AssemblyType::Quad,
            src: Operand::Register(Register::SP),
            dest: Operand::Register(Register::BP),
        },
        Instruction::AllocateStack(round_up_16(func.stack_size)),
    ];

    for instruction in &func.instructions {
        fix_instruction(instruction, &mut fixed);
    }

    func.instructions = fixed;
}

fn mov(ty: AssemblyType, src: Operand, dest: Operand) -> Instruction {
    Instruction::Mov { ty, src, dest }
}

fn reg(register: Register) -> Operand {
    Operand::Register(register)
}

fn fix_instruction(instruction: &Instruction, fixed: &mut Vec<Instruction>) {
    match instruction {
        Instruction::Ret => {
            fixed.push(mov(
                AssemblyType::Quad,
                reg(Register::BP),
                reg(Register::SP),
            ));
            fixed.push(Instruction::Pop(Register::BP));
            fixed.push(Instruction::Ret);
        }
        Instruction::Mov { ty, src, dest } => {
            let mut src = src.clone();

            // a longword immediate field is 32 bits, keep only those
            if *ty == AssemblyType::Long {
                if let Operand::Imm(i) = src {
                    src = Operand::Imm((i as i32) as i64);
                }
            }

            if src.is_large_imm() && dest.is_memory() {
                fixed.push(mov(*ty, src, reg(Register::R10)));
                fixed.push(mov(*ty, reg(Register::R10), dest.clone()));
            } else if src.is_memory() && dest.is_memory() {
                fixed.push(mov(*ty, src, reg(Register::R10)));
                fixed.push(mov(*ty, reg(Register::R10), dest.clone()));
            } else {
                fixed.push(mov(*ty, src, dest.clone()));
            }
        }
        Instruction::Movsx { src, dest } => {
            let src = if matches!(src, Operand::Imm(_)) {
                fixed.push(mov(AssemblyType::Long, src.clone(), reg(Register::R10)));
                reg(Register::R10)
            } else {
                src.clone()
            };

            if dest.is_memory() {
                fixed.push(Instruction::Movsx {
                    src,
                    dest: reg(Register::R11),
                });
                fixed.push(mov(AssemblyType::Quad, reg(Register::R11), dest.clone()));
            } else {
                fixed.push(Instruction::Movsx {
                    src,
                    dest: dest.clone(),
                });
            }
        }
        Instruction::MovZeroExtend { src, dest } => {
            // a longword move into a register zero-extends by itself
            if dest.is_memory() {
                fixed.push(mov(AssemblyType::Long, src.clone(), reg(Register::R11)));
                fixed.push(mov(AssemblyType::Quad, reg(Register::R11), dest.clone()));
            } else {
                fixed.push(mov(AssemblyType::Long, src.clone(), dest.clone()));
            }
        }
        Instruction::Binary {
            op: op @ (BinaryOp::Sal | BinaryOp::Sar | BinaryOp::Shr),
            ty,
            src,
            dest,
        } => {
            // the count is an immediate or already in CL
            fixed.push(Instruction::Binary {
                op: op.clone(),
                ty: *ty,
                src: src.clone(),
                dest: dest.clone(),
            });
        }
        Instruction::Binary {
            op: BinaryOp::Mult,
            ty,
            src,
            dest,
        } => {
            let src = if src.is_large_imm() {
                fixed.push(mov(*ty, src.clone(), reg(Register::R10)));
                reg(Register::R10)
            } else {
                src.clone()
            };

            if dest.is_memory() {
                fixed.push(mov(*ty, dest.clone(), reg(Register::R11)));
                fixed.push(Instruction::Binary {
                    op: BinaryOp::Mult,
                    ty: *ty,
                    src,
                    dest: reg(Register::R11),
                });
                fixed.push(mov(*ty, reg(Register::R11), dest.clone()));
            } else {
                fixed.push(Instruction::Binary {
                    op: BinaryOp::Mult,
                    ty: *ty,
                    src,
                    dest: dest.clone(),
                });
            }
        }
        Instruction::Binary { op, ty, src, dest } => {
            let needs_scratch =
                src.is_large_imm() || (src.is_memory() && dest.is_memory());

            let src = if needs_scratch {
                fixed.push(mov(*ty, src.clone(), reg(Register::R10)));
                reg(Register::R10)
            } else {
                src.clone()
            };

            fixed.push(Instruction::Binary {
                op: op.clone(),
                ty: *ty,
                src,
                dest: dest.clone(),
            });
        }
        Instruction::Cmp(ty, first, second) => {
            let first = if first.is_large_imm() || (first.is_memory() && second.is_memory()) {
                fixed.push(mov(*ty, first.clone(), reg(Register::R10)));
                reg(Register::R10)
            } else {
                first.clone()
            };

            // cmp cannot take an immediate in the second slot
            let second = if matches!(second, Operand::Imm(_)) {
                fixed.push(mov(*ty, second.clone(), reg(Register::R11)));
                reg(Register::R11)
            } else {
                second.clone()
            };

            fixed.push(Instruction::Cmp(*ty, first, second));
        }
        Instruction::Idiv(ty, op) => {
            if matches!(op, Operand::Imm(_)) {
                fixed.push(mov(*ty, op.clone(), reg(Register::R10)));
                fixed.push(Instruction::Idiv(*ty, reg(Register::R10)));
            } else {
                fixed.push(instruction.clone());
            }
        }
        Instruction::Div(ty, op) => {
            if matches!(op, Operand::Imm(_)) {
                fixed.push(mov(*ty, op.clone(), reg(Register::R10)));
                fixed.push(Instruction::Div(*ty, reg(Register::R10)));
            } else {
                fixed.push(instruction.clone());
            }
        }
        Instruction::Push(op) => {
            if op.is_large_imm() {
                fixed.push(mov(AssemblyType::Quad, op.clone(), reg(Register::R10)));
                fixed.push(Instruction::Push(reg(Register::R10)));
            } else {
                fixed.push(instruction.clone());
            }
        }
        _ => fixed.push(instruction.clone()),
    }
}
