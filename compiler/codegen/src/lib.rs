use std::collections::HashMap;

use lir::*;
use mir::tacky;
use mir::tacky::Val;
use ty::{Constant, Type};

use crate::fix_instructions::fix_invalid_instructions;
use crate::replace_pseudoregisters::replace_pseudos;

mod fix_instructions;
mod replace_pseudoregisters;

macro_rules! tb {
    ($variant:ident) => {
        tacky::BinaryOp::$variant
    };
    ($head:ident | $($tail:ident)|+) => {
        tb!($head) | tb!($($tail)|+)
    };
}

const PARAM_PASSING_REGS: [Register; 6] = [
    Register::DI,
    Register::SI,
    Register::DX,
    Register::CX,
    Register::R8,
    Register::R9,
];

/// Types of every name a function's instructions can mention: its own
/// locals and temporaries, plus all static-storage objects
struct TypeEnv<'a> {
    vars: &'a HashMap<String, Type>,
    globals: &'a HashMap<String, Type>,
}

impl TypeEnv<'_> {
    fn ty(&self, val: &Val) -> Type {
        match val {
            Val::Constant(c) => c.ty(),
            Val::Var(name) => self
                .vars
                .get(name)
                .or_else(|| self.globals.get(name))
                .cloned()
                .unwrap_or_else(|| {
                    panic!("Internal Error: no type recorded for '{}'", name)
                }),
        }
    }

    fn asm_ty(&self, val: &Val) -> AssemblyType {
        asm_type(&self.ty(val))
    }
}

fn asm_type(ty: &Type) -> AssemblyType {
    match ty.size() {
        4 => AssemblyType::Long,
        8 => AssemblyType::Quad,
        _ => unreachable!("Internal Error: object sizes are 4 or 8 bytes"),
    }
}

pub fn gen_assm(tacky: &tacky::TranslationUnit) -> (Program, AsmTable) {
    let mut table = AsmTable::new();
    let mut globals = HashMap::new();

    for var in &tacky.statics {
        table.add_obj(var.name.clone(), asm_type(&var.ty), true);
        globals.insert(var.name.clone(), var.ty.clone());
    }

    for func in &tacky.funcs {
        table.add_func(func.name.clone(), true);

        for (name, ty) in &func.var_types {
            table.add_obj(name.clone(), asm_type(ty), false);
        }
    }

    let statics = tacky.statics.iter().map(gen_static_var).collect();
    let funcs = tacky
        .funcs
        .iter()
        .map(|func| gen_func(func, &globals))
        .collect();

    let mut prog = Program { statics, funcs };

    replace_pseudos(&mut prog, &table);
    fix_invalid_instructions(&mut prog);

    (prog, table)
}

fn gen_static_var(var: &tacky::StaticVar) -> StaticVar {
    StaticVar {
        name: var.name.clone(),
        global: !var.is_static,
        alignment: var.ty.size(),
        init: var.init.unwrap_or_else(|| Constant::zero(&var.ty)),
    }
}

fn gen_func(func: &tacky::Func, globals: &HashMap<String, Type>) -> Func {
    let env = TypeEnv {
        vars: &func.var_types,
        globals,
    };

    let mut instructions = gen_params(&func.params, &env);
    instructions.append(&mut gen_instructions(&func.instructions, &env));

    Func {
        name: func.name.clone(),
        global: true,
        instructions,
        stack_size: 0,
    }
}

fn gen_params(params: &[String], env: &TypeEnv) -> Vec<Instruction> {
    let (register_params, stack_params) = if params.len() > 6 {
        params.split_at(6)
    } else {
        (params, &[] as &[String])
    };

    let mut instructions = vec![];

    // first six arrive in registers
    for (i, param) in register_params.iter().enumerate() {
        instructions.push(Instruction::Mov {
            ty: env.asm_ty(&Val::Var(param.clone())),
            src: Operand::Register(PARAM_PASSING_REGS[i].clone()),
            dest: Operand::Pseudo(param.clone()),
        })
    }

    // the rest were pushed by the caller above the return address
    for (i, param) in stack_params.iter().enumerate() {
        instructions.push(Instruction::Mov {
            ty: env.asm_ty(&Val::Var(param.clone())),
            src: Operand::Stack(16 + 8 * i as i32),
            dest: Operand::Pseudo(param.clone()),
        })
    }

    instructions
}

fn gen_instructions(instructions: &[tacky::Instruction], env: &TypeEnv) -> Vec<Instruction> {
    let mut assm_instr = vec![];

    for i in instructions {
        match i {
            tacky::Instruction::Return(val) => {
                assm_instr.push(Instruction::Mov {
                    ty: env.asm_ty(val),
                    src: gen_operand(val),
                    dest: Operand::Register(Register::AX),
                });
                assm_instr.push(Instruction::Ret);
            }
            tacky::Instruction::Unary {
                op: tacky::UnaryOp::Not,
                src,
                dest,
            } => {
                assm_instr.push(Instruction::Cmp(
                    env.asm_ty(src),
                    Operand::Imm(0),
                    gen_operand(src),
                ));
                assm_instr.push(Instruction::Mov {
                    ty: env.asm_ty(dest),
                    src: Operand::Imm(0),
                    dest: gen_operand(dest),
                });
                assm_instr.push(Instruction::SetCond {
                    condition: Condition::E,
                    dest: gen_operand(dest),
                });
            }
            tacky::Instruction::Unary { op, src, dest } => {
                let ty = env.asm_ty(dest);

                assm_instr.push(Instruction::Mov {
                    ty,
                    src: gen_operand(src),
                    dest: gen_operand(dest),
                });
                assm_instr.push(Instruction::Unary {
                    op: gen_unary(op),
                    ty,
                    dest: gen_operand(dest),
                });
            }
            tacky::Instruction::Binary {
                op,
                first,
                second,
                dest,
            } => gen_binary(&mut assm_instr, op, first, second, dest, env),
            tacky::Instruction::Copy { src, dest } => gen_copy(&mut assm_instr, src, dest, env),
            tacky::Instruction::Jump { target } => assm_instr.push(Instruction::Jmp {
                label: target.clone(),
            }),
            tacky::Instruction::JumpIfZero { condition, target } => {
                assm_instr.push(Instruction::Cmp(
                    env.asm_ty(condition),
                    Operand::Imm(0),
                    gen_operand(condition),
                ));
                assm_instr.push(Instruction::JmpCond {
                    condition: Condition::E,
                    label: target.clone(),
                });
            }
            tacky::Instruction::JumpIfNotZero { condition, target } => {
                assm_instr.push(Instruction::Cmp(
                    env.asm_ty(condition),
                    Operand::Imm(0),
                    gen_operand(condition),
                ));
                assm_instr.push(Instruction::JmpCond {
                    condition: Condition::NE,
                    label: target.clone(),
                });
            }
            tacky::Instruction::Label(identifier) => {
                assm_instr.push(Instruction::Label(identifier.clone()))
            }
            tacky::Instruction::FunCall {
                func_name,
                args,
                dest,
            } => gen_call(&mut assm_instr, func_name, args, dest, env),
        }
    }

    assm_instr
}

fn gen_binary(
    assm_instr: &mut Vec<Instruction>,
    op: &tacky::BinaryOp,
    first: &Val,
    second: &Val,
    dest: &Val,
    env: &TypeEnv,
) {
    match op {
        // signed division leaves quotient in AX, remainder in DX
        tb!(Divide | Modulo) => {
            let ty = env.asm_ty(dest);

            assm_instr.push(Instruction::Mov {
                ty,
                src: gen_operand(first),
                dest: Operand::Register(Register::AX),
            });
            assm_instr.push(Instruction::Cdq(ty));
            assm_instr.push(Instruction::Idiv(ty, gen_operand(second)));
            assm_instr.push(Instruction::Mov {
                ty,
                src: Operand::Register(if *op == tacky::BinaryOp::Divide {
                    Register::AX
                } else {
                    Register::DX
                }),
                dest: gen_operand(dest),
            });
        }
        // unsigned division zeroes DX instead of sign-extending into it
        tb!(DivideUnsigned | ModuloUnsigned) => {
            let ty = env.asm_ty(dest);

            assm_instr.push(Instruction::Mov {
                ty,
                src: gen_operand(first),
                dest: Operand::Register(Register::AX),
            });
            assm_instr.push(Instruction::Mov {
                ty,
                src: Operand::Imm(0),
                dest: Operand::Register(Register::DX),
            });
            assm_instr.push(Instruction::Div(ty, gen_operand(second)));
            assm_instr.push(Instruction::Mov {
                ty,
                src: Operand::Register(if *op == tacky::BinaryOp::DivideUnsigned {
                    Register::AX
                } else {
                    Register::DX
                }),
                dest: gen_operand(dest),
            });
        }
        tb!(BitshiftLeft | BitshiftRight | BitshiftRightUnsigned) => {
            let ty = env.asm_ty(dest);
            let op = gen_shift(op);

            assm_instr.push(Instruction::Mov {
                ty,
                src: gen_operand(first),
                dest: gen_operand(dest),
            });

            match second {
                Val::Constant(c) => {
                    // hardware masks the count to the operand width
                    let mask = match ty {
                        AssemblyType::Long => 31,
                        AssemblyType::Quad => 63,
                    };

                    assm_instr.push(Instruction::Binary {
                        op,
                        ty,
                        src: Operand::Imm(c.as_i64() & mask),
                        dest: gen_operand(dest),
                    });
                }
                Val::Var(_) => {
                    assm_instr.push(Instruction::Mov {
                        ty: env.asm_ty(second),
                        src: gen_operand(second),
                        dest: Operand::Register(Register::CX),
                    });
                    assm_instr.push(Instruction::Binary {
                        op,
                        ty,
                        src: Operand::Register(Register::CX),
                        dest: gen_operand(dest),
                    });
                }
            }
        }
        tb!(Equal
            | NotEqual
            | Less
            | LessEqual
            | Greater
            | GreaterEqual
            | LessUnsigned
            | LessEqualUnsigned
            | GreaterUnsigned
            | GreaterEqualUnsigned) => {
            assm_instr.push(Instruction::Cmp(
                env.asm_ty(first),
                gen_operand(second),
                gen_operand(first),
            ));
            assm_instr.push(Instruction::Mov {
                ty: env.asm_ty(dest),
                src: Operand::Imm(0),
                dest: gen_operand(dest),
            });
            assm_instr.push(Instruction::SetCond {
                condition: gen_cond(op),
                dest: gen_operand(dest),
            });
        }
        tb!(Add | Subtract | Multiply | BitwiseAnd | BitwiseOr | BitwiseXor) => {
            let ty = env.asm_ty(dest);

            assm_instr.push(Instruction::Mov {
                ty,
                src: gen_operand(first),
                dest: gen_operand(dest),
            });
            assm_instr.push(Instruction::Binary {
                op: gen_arith(op),
                ty,
                src: gen_operand(second),
                dest: gen_operand(dest),
            });
        }
    }
}

/// A Copy between different widths widens (sign- or zero-extending from the
/// source type) or narrows (truncating); same-width copies are plain moves
fn gen_copy(assm_instr: &mut Vec<Instruction>, src: &Val, dest: &Val, env: &TypeEnv) {
    let src_ty = env.ty(src);
    let dest_ty = env.ty(dest);

    match (src_ty.size(), dest_ty.size()) {
        (4, 8) => {
            if src_ty.is_signed() {
                assm_instr.push(Instruction::Movsx {
                    src: gen_operand(src),
                    dest: gen_operand(dest),
                });
            } else {
                assm_instr.push(Instruction::MovZeroExtend {
                    src: gen_operand(src),
                    dest: gen_operand(dest),
                });
            }
        }
        (8, 4) => {
            assm_instr.push(Instruction::Mov {
                ty: AssemblyType::Long,
                src: gen_operand(src),
                dest: gen_operand(dest),
            });
        }
        _ => {
            assm_instr.push(Instruction::Mov {
                ty: asm_type(&dest_ty),
                src: gen_operand(src),
                dest: gen_operand(dest),
            });
        }
    }
}

fn gen_call(
    assm_instr: &mut Vec<Instruction>,
    func_name: &str,
    args: &[Val],
    dest: &Val,
    env: &TypeEnv,
) {
    let (reg_args, stack_args) = if args.len() > 6 {
        args.split_at(6)
    } else {
        (args, &[] as &[Val])
    };

    // an odd number of 8-byte pushes would leave RSP misaligned at the call
    let stack_padding = if stack_args.len() % 2 == 0 { 0 } else { 8 };

    if stack_padding != 0 {
        assm_instr.push(Instruction::AllocateStack(stack_padding));
    }

    for (i, arg) in reg_args.iter().enumerate() {
        assm_instr.push(Instruction::Mov {
            ty: env.asm_ty(arg),
            src: gen_operand(arg),
            dest: Operand::Register(PARAM_PASSING_REGS[i].clone()),
        });
    }

    for arg in stack_args.iter().rev() {
        let operand = gen_operand(arg);

        if env.asm_ty(arg) == AssemblyType::Quad
            && matches!(operand, Operand::Register(_) | Operand::Imm(_))
        {
            assm_instr.push(Instruction::Push(operand));
        } else {
            // widen through AX so the push reads a full quadword
            assm_instr.push(Instruction::Mov {
                ty: env.asm_ty(arg),
                src: operand,
                dest: Operand::Register(Register::AX),
            });
            assm_instr.push(Instruction::Push(Operand::Register(Register::AX)));
        }
    }

    assm_instr.push(Instruction::Call(func_name.to_string()));

    let bytes_to_remove = 8 * stack_args.len() as i32 + stack_padding;

    if bytes_to_remove != 0 {
        assm_instr.push(Instruction::DeallocateStack(bytes_to_remove));
    }

    assm_instr.push(Instruction::Mov {
        ty: env.asm_ty(dest),
        src: Operand::Register(Register::AX),
        dest: gen_operand(dest),
    });
}

fn gen_unary(operator: &tacky::UnaryOp) -> UnaryOp {
    match operator {
        tacky::UnaryOp::Complement => UnaryOp::Not,
        tacky::UnaryOp::Negate => UnaryOp::Neg,
        tacky::UnaryOp::Not => {
            unreachable!("Internal Error: TACKY 'Not' has its own lowering")
        }
    }
}

fn gen_arith(operator: &tacky::BinaryOp) -> BinaryOp {
    match operator {
        tacky::BinaryOp::Add => BinaryOp::Add,
        tacky::BinaryOp::Subtract => BinaryOp::Sub,
        tacky::BinaryOp::Multiply => BinaryOp::Mult,
        tacky::BinaryOp::BitwiseAnd => BinaryOp::And,
        tacky::BinaryOp::BitwiseOr => BinaryOp::Or,
        tacky::BinaryOp::BitwiseXor => BinaryOp::Xor,
        _ => unreachable!(
            "Internal Error: cannot convert {:?} into an arithmetic mnemonic",
            operator
        ),
    }
}

fn gen_shift(operator: &tacky::BinaryOp) -> BinaryOp {
    match operator {
        tacky::BinaryOp::BitshiftLeft => BinaryOp::Sal,
        tacky::BinaryOp::BitshiftRight => BinaryOp::Sar,
        tacky::BinaryOp::BitshiftRightUnsigned => BinaryOp::Shr,
        _ => unreachable!("Internal Error: not a shift operator: {:?}", operator),
    }
}

fn gen_operand(operand: &Val) -> Operand {
    match operand {
        Val::Constant(c) => Operand::Imm(c.as_i64()),
        Val::Var(var) => Operand::Pseudo(var.clone()),
    }
}

fn gen_cond(op: &tacky::BinaryOp) -> Condition {
    match op {
        tacky::BinaryOp::Equal => Condition::E,
        tacky::BinaryOp::NotEqual => Condition::NE,
        tacky::BinaryOp::Less => Condition::L,
        tacky::BinaryOp::LessEqual => Condition::LE,
        tacky::BinaryOp::Greater => Condition::G,
        tacky::BinaryOp::GreaterEqual => Condition::GE,
        tacky::BinaryOp::LessUnsigned => Condition::B,
        tacky::BinaryOp::LessEqualUnsigned => Condition::BE,
        tacky::BinaryOp::GreaterUnsigned => Condition::A,
        tacky::BinaryOp::GreaterEqualUnsigned => Condition::AE,
        _ => panic!("Internal Error: Not a condition operator: {:?}", op),
    }
}
