use std::collections::HashMap;

use ast::{BinaryOp, BlockItem, Expr, ForInit, Stmt, UnaryOp, VarDecl};
use ty::{common_type, const_convert, Constant, SymbolTable, Type};

use crate::const_fold::const_eval;
use crate::sem_err::{SemErr, SemanticResult};
use crate::tacky;
use crate::tacky::Instruction::{Jump, JumpIfNotZero, JumpIfZero};
use crate::tacky::{Instruction, Val};

struct LoopContext {
    continue_label: String,
    break_label: String,
}

/// Lowering state for one compilation: label/temporary factories, the
/// file-scope symbol table, the loop-context stack, and the per-function
/// rename maps. Reset where noted when a new function begins.
pub struct TackyGen {
    symbols: SymbolTable,
    statics: Vec<tacky::StaticVar>,
    var_counter: i32,
    label_counter: i32,
    static_counter: i32,
    loop_stack: Vec<LoopContext>,

    // per-function state
    locals: HashMap<String, String>,
    static_locals: HashMap<String, String>,
    var_types: HashMap<String, Type>,
    return_type: Type,
}

pub fn gen_tacky(ast: &ast::TranslationUnit) -> SemanticResult<tacky::TranslationUnit> {
    TackyGen::new().gen(ast)
}

impl TackyGen {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            statics: vec![],
            var_counter: 0,
            label_counter: 0,
            static_counter: 0,
            loop_stack: vec![],
            locals: HashMap::new(),
            static_locals: HashMap::new(),
            var_types: HashMap::new(),
            return_type: Type::Int,
        }
    }

    pub fn gen(mut self, ast: &ast::TranslationUnit) -> SemanticResult<tacky::TranslationUnit> {
        let mut funcs = vec![];

        for decl in &ast.decls {
            match decl {
                ast::Decl::FuncDecl(func) => funcs.push(self.gen_func(func)?),
                ast::Decl::VarDecl(var) => self.gen_file_scope_var(var)?,
            }
        }

        Ok(tacky::TranslationUnit {
            statics: self.statics,
            funcs,
        })
    }

    fn gen_file_scope_var(&mut self, var: &VarDecl) -> SemanticResult<()> {
        if self.symbols.is_defined(&var.name) {
            return Err(SemErr::VariableRedefinition(var.name.clone()));
        }

        let init = self.fold_initializer(var)?;

        self.symbols
            .add_static_var(var.name.clone(), var.var_type.clone(), !var.is_static);

        self.statics.push(tacky::StaticVar {
            name: var.name.clone(),
            ty: var.var_type.clone(),
            init,
            is_static: var.is_static,
        });

        Ok(())
    }

    fn fold_initializer(&self, var: &VarDecl) -> SemanticResult<Option<Constant>> {
        match &var.init {
            None => Ok(None),
            Some(expr) => {
                let folded = const_eval(expr)
                    .ok_or_else(|| SemErr::NonConstantInitializer(var.name.clone()))?;

                Ok(Some(const_convert(&var.var_type, Constant::Long(folded))))
            }
        }
    }

    fn gen_func(&mut self, func: &ast::FuncDecl) -> SemanticResult<tacky::Func> {
        if self.symbols.is_defined(&func.ident) {
            return Err(SemErr::FunctionRedefinition(func.ident.clone()));
        }

        self.symbols.add_func(
            func.ident.clone(),
            Type::Func(func.func_type.clone()),
            true,
            true,
        );

        self.locals.clear();
        self.static_locals.clear();
        self.var_types.clear();
        self.return_type = (*func.func_type.return_type).clone();

        let mut params = vec![];

        for (name, ty) in func.params.iter().zip(&func.func_type.param_types) {
            if self.locals.contains_key(name) {
                return Err(SemErr::VariableRedefinition(name.clone()));
            }

            let unique = self.rename_local(name, ty);
            params.push(unique);
        }

        let mut instructions = self.gen_block(&func.body)?;

        // every body falls off its end into `return 0`
        instructions.push(Instruction::Return(Val::Constant(Constant::Int(0))));

        Ok(tacky::Func {
            name: func.ident.clone(),
            params,
            var_types: std::mem::take(&mut self.var_types),
            instructions,
        })
    }

    fn gen_block(&mut self, block: &ast::Block) -> SemanticResult<Vec<Instruction>> {
        let mut instructions = vec![];

        for block_item in &block.items {
            match block_item {
                BlockItem::S(stmt) => {
                    instructions.append(&mut self.gen_stmt(stmt)?);
                }
                BlockItem::D(decl) => {
                    instructions.append(&mut self.gen_local_decl(decl)?);
                }
            }
        }

        Ok(instructions)
    }

    fn gen_local_decl(&mut self, decl: &VarDecl) -> SemanticResult<Vec<Instruction>> {
        if self.locals.contains_key(&decl.name) || self.static_locals.contains_key(&decl.name) {
            return Err(SemErr::VariableRedefinition(decl.name.clone()));
        }

        if decl.is_static {
            let init = self.fold_initializer(decl)?;

            let unique = format!("{}.static.{}", decl.name, self.static_counter);
            self.static_counter += 1;

            self.static_locals.insert(decl.name.clone(), unique.clone());
            self.symbols
                .add_static_var(unique.clone(), decl.var_type.clone(), false);
            self.statics.push(tacky::StaticVar {
                name: unique,
                ty: decl.var_type.clone(),
                init,
                is_static: true,
            });

            return Ok(vec![]);
        }

        let unique = self.rename_local(&decl.name, &decl.var_type);

        match &decl.init {
            Some(init) => {
                let (mut instructions, result) = self.gen_expr(init)?;
                let result = self.coerce_constant(result, &decl.var_type);

                instructions.push(Instruction::Copy {
                    src: result,
                    dest: Val::Var(unique),
                });

                Ok(instructions)
            }
            None => Ok(vec![]),
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> SemanticResult<Vec<Instruction>> {
        match stmt {
            Stmt::Return { expr } => {
                let (mut instructions, value) = self.gen_expr(expr)?;
                let target = self.return_type.clone();
                let value = self.convert_to(&mut instructions, value, &target);

                instructions.push(Instruction::Return(value));

                Ok(instructions)
            }
            Stmt::Expression { expr } => {
                let (instructions, _) = self.gen_expr(expr)?;
                Ok(instructions)
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                let else_label = self.make_label("else");
                let end_label = self.make_label("end_if");

                let (mut instructions, c) = self.gen_expr(condition)?;

                instructions.push(JumpIfZero {
                    condition: c,
                    target: if otherwise.is_some() {
                        else_label.clone()
                    } else {
                        end_label.clone()
                    },
                });

                instructions.append(&mut self.gen_stmt(then)?);

                if let Some(otherwise) = otherwise {
                    instructions.push(Jump {
                        target: end_label.clone(),
                    });
                    instructions.push(Instruction::Label(else_label));
                    instructions.append(&mut self.gen_stmt(otherwise)?);
                }

                instructions.push(Instruction::Label(end_label));

                Ok(instructions)
            }
            Stmt::Compound { block } => self.gen_block(block),
            Stmt::Break => match self.loop_stack.last() {
                None => Err(SemErr::BreakOutsideLoop),
                Some(ctx) => Ok(vec![Jump {
                    target: ctx.break_label.clone(),
                }]),
            },
            Stmt::Continue => match self.loop_stack.last() {
                None => Err(SemErr::ContinueOutsideLoop),
                Some(ctx) => Ok(vec![Jump {
                    target: ctx.continue_label.clone(),
                }]),
            },
            Stmt::While { condition, body } => {
                let continue_label = self.make_label("while_cont");
                let break_label = self.make_label("while_brk");

                let mut instructions = vec![Instruction::Label(continue_label.clone())];

                let (mut cond_instr, cond) = self.gen_expr(condition)?;
                instructions.append(&mut cond_instr);
                instructions.push(JumpIfZero {
                    condition: cond,
                    target: break_label.clone(),
                });

                self.loop_stack.push(LoopContext {
                    continue_label: continue_label.clone(),
                    break_label: break_label.clone(),
                });
                instructions.append(&mut self.gen_stmt(body)?);
                self.loop_stack.pop();

                instructions.push(Jump {
                    target: continue_label,
                });
                instructions.push(Instruction::Label(break_label));

                Ok(instructions)
            }
            Stmt::DoWhile { body, condition } => {
                let start_label = self.make_label("do_start");
                let continue_label = self.make_label("do_cont");
                let break_label = self.make_label("do_brk");

                let mut instructions = vec![Instruction::Label(start_label.clone())];

                self.loop_stack.push(LoopContext {
                    continue_label: continue_label.clone(),
                    break_label: break_label.clone(),
                });
                instructions.append(&mut self.gen_stmt(body)?);
                self.loop_stack.pop();

                instructions.push(Instruction::Label(continue_label));

                let (mut cond_instr, cond) = self.gen_expr(condition)?;
                instructions.append(&mut cond_instr);
                instructions.push(JumpIfNotZero {
                    condition: cond,
                    target: start_label,
                });
                instructions.push(Instruction::Label(break_label));

                Ok(instructions)
            }
            Stmt::For {
                init,
                condition,
                post,
                body,
            } => {
                let start_label = self.make_label("for_start");
                let continue_label = self.make_label("for_cont");
                let break_label = self.make_label("for_brk");

                let mut instructions = match init {
                    ForInit::Decl(decl) => self.gen_local_decl(decl)?,
                    ForInit::Expr(Some(expr)) => self.gen_expr(expr)?.0,
                    ForInit::Expr(None) => vec![],
                };

                instructions.push(Instruction::Label(start_label.clone()));

                if let Some(expr) = condition {
                    let (mut cond_instr, cond) = self.gen_expr(expr)?;
                    instructions.append(&mut cond_instr);
                    instructions.push(JumpIfZero {
                        condition: cond,
                        target: break_label.clone(),
                    });
                }

                self.loop_stack.push(LoopContext {
                    continue_label: continue_label.clone(),
                    break_label: break_label.clone(),
                });
                instructions.append(&mut self.gen_stmt(body)?);
                self.loop_stack.pop();

                instructions.push(Instruction::Label(continue_label));

                if let Some(expr) = post {
                    instructions.append(&mut self.gen_expr(expr)?.0);
                }

                instructions.push(Jump {
                    target: start_label,
                });
                instructions.push(Instruction::Label(break_label));

                Ok(instructions)
            }
            Stmt::Null => Ok(vec![]),
        }
    }

    fn gen_expr(&mut self, expr: &Expr) -> SemanticResult<(Vec<Instruction>, Val)> {
        match expr {
            Expr::Constant(c) => Ok((vec![], Val::Constant(*c))),
            Expr::Var(name) => {
                let unique = self.resolve_var(name)?;
                Ok((vec![], Val::Var(unique)))
            }
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => {
                let (mut instructions, inner) = self.gen_expr(expr)?;
                let dest = self.make_temp(&Type::Int);

                instructions.push(Instruction::Unary {
                    op: tacky::UnaryOp::Not,
                    src: inner,
                    dest: dest.clone(),
                });

                Ok((instructions, dest))
            }
            Expr::Unary { op, expr } => {
                let (mut instructions, inner) = self.gen_expr(expr)?;
                let ty = self.val_type(&inner);
                let dest = self.make_temp(&ty);
                let op = gen_unop(*op);

                instructions.push(Instruction::Unary {
                    op,
                    src: inner,
                    dest: dest.clone(),
                });

                Ok((instructions, dest))
            }
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let (left_instr, v1) = self.gen_expr(left)?;
                let (right_instr, v2) = self.gen_expr(right)?;
                let false_label = self.make_label("and_false");
                let end_label = self.make_label("and_end");
                let dest = self.make_temp(&Type::Int);

                let instructions = left_instr
                    .into_iter()
                    .chain(vec![JumpIfZero {
                        condition: v1,
                        target: false_label.clone(),
                    }])
                    .chain(right_instr)
                    .chain(vec![
                        JumpIfZero {
                            condition: v2,
                            target: false_label.clone(),
                        },
                        Instruction::Copy {
                            src: Val::Constant(Constant::Int(1)),
                            dest: dest.clone(),
                        },
                        Jump {
                            target: end_label.clone(),
                        },
                        Instruction::Label(false_label),
                        Instruction::Copy {
                            src: Val::Constant(Constant::Int(0)),
                            dest: dest.clone(),
                        },
                        Instruction::Label(end_label),
                    ])
                    .collect();

                Ok((instructions, dest))
            }
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                let (left_instr, v1) = self.gen_expr(left)?;
                let (right_instr, v2) = self.gen_expr(right)?;
                let true_label = self.make_label("or_true");
                let end_label = self.make_label("or_end");
                let dest = self.make_temp(&Type::Int);

                let instructions = left_instr
                    .into_iter()
                    .chain(vec![JumpIfNotZero {
                        condition: v1,
                        target: true_label.clone(),
                    }])
                    .chain(right_instr)
                    .chain(vec![
                        JumpIfNotZero {
                            condition: v2,
                            target: true_label.clone(),
                        },
                        Instruction::Copy {
                            src: Val::Constant(Constant::Int(0)),
                            dest: dest.clone(),
                        },
                        Jump {
                            target: end_label.clone(),
                        },
                        Instruction::Label(true_label),
                        Instruction::Copy {
                            src: Val::Constant(Constant::Int(1)),
                            dest: dest.clone(),
                        },
                        Instruction::Label(end_label),
                    ])
                    .collect();

                Ok((instructions, dest))
            }
            Expr::Binary {
                op: op @ (BinaryOp::BitshiftLeft | BinaryOp::BitshiftRight),
                left,
                right,
            } => {
                // shifts take the left operand's type; no promotion of the count
                let (mut instructions, first) = self.gen_expr(left)?;
                let (mut right_instr, second) = self.gen_expr(right)?;
                instructions.append(&mut right_instr);

                let left_ty = self.val_type(&first);
                let op = match op {
                    BinaryOp::BitshiftLeft => tacky::BinaryOp::BitshiftLeft,
                    BinaryOp::BitshiftRight if left_ty.is_signed() => {
                        tacky::BinaryOp::BitshiftRight
                    }
                    BinaryOp::BitshiftRight => tacky::BinaryOp::BitshiftRightUnsigned,
                    _ => unreachable!("Internal Error: not a shift operator: {:?}", op),
                };

                let dest = self.make_temp(&left_ty);

                instructions.push(Instruction::Binary {
                    op,
                    first,
                    second,
                    dest: dest.clone(),
                });

                Ok((instructions, dest))
            }
            Expr::Binary { op, left, right } => {
                let (mut instructions, first) = self.gen_expr(left)?;
                let (mut right_instr, second) = self.gen_expr(right)?;
                instructions.append(&mut right_instr);

                let common = common_type(&self.val_type(&first), &self.val_type(&second));
                let first = self.convert_to(&mut instructions, first, &common);
                let second = self.convert_to(&mut instructions, second, &common);

                let dest = if is_comparison(*op) {
                    self.make_temp(&Type::Int)
                } else {
                    self.make_temp(&common)
                };

                instructions.push(Instruction::Binary {
                    op: gen_typed_binop(*op, &common),
                    first,
                    second,
                    dest: dest.clone(),
                });

                Ok((instructions, dest))
            }
            Expr::Assignment { lvalue, expr } => {
                let name = match &**lvalue {
                    Expr::Var(name) => name,
                    _ => unreachable!("Internal Error: assignment lvalue should always be a Var"),
                };

                let unique = self.resolve_var(name)?;
                let target_ty = self.val_type(&Val::Var(unique.clone()));

                let (mut instructions, result) = self.gen_expr(expr)?;
                let result = self.coerce_constant(result, &target_ty);

                instructions.push(Instruction::Copy {
                    src: result,
                    dest: Val::Var(unique.clone()),
                });

                Ok((instructions, Val::Var(unique)))
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let (mut instructions, c) = self.gen_expr(condition)?;
                let (mut then_instr, v1) = self.gen_expr(then)?;
                let (mut else_instr, v2) = self.gen_expr(otherwise)?;

                let common = common_type(&self.val_type(&v1), &self.val_type(&v2));
                let result = self.make_temp(&common);
                let else_label = self.make_label("cond_else");
                let end_label = self.make_label("cond_end");

                instructions.push(JumpIfZero {
                    condition: c,
                    target: else_label.clone(),
                });

                instructions.append(&mut then_instr);
                let v1 = self.coerce_constant(v1, &common);
                instructions.push(Instruction::Copy {
                    src: v1,
                    dest: result.clone(),
                });
                instructions.push(Jump {
                    target: end_label.clone(),
                });

                instructions.push(Instruction::Label(else_label));
                instructions.append(&mut else_instr);
                let v2 = self.coerce_constant(v2, &common);
                instructions.push(Instruction::Copy {
                    src: v2,
                    dest: result.clone(),
                });

                instructions.push(Instruction::Label(end_label));

                Ok((instructions, result))
            }
            Expr::FunctionCall { func, args } => {
                let func_type = match self.symbols.get(func) {
                    Some(ty::Symbol {
                        t: Type::Func(func_type),
                        ..
                    }) => func_type.clone(),
                    _ => return Err(SemErr::UndeclaredFunction(func.clone())),
                };

                if args.len() != func_type.param_types.len() {
                    return Err(SemErr::WrongArgumentCount {
                        name: func.clone(),
                        expected: func_type.param_types.len(),
                        found: args.len(),
                    });
                }

                let mut instructions = vec![];
                let mut arg_vals = vec![];

                for (arg, param_ty) in args.iter().zip(&func_type.param_types) {
                    let (mut arg_instr, v) = self.gen_expr(arg)?;
                    instructions.append(&mut arg_instr);

                    let v = self.convert_to(&mut instructions, v, param_ty);
                    arg_vals.push(v);
                }

                let dest = self.make_temp(&func_type.return_type);

                instructions.push(Instruction::FunCall {
                    func_name: func.clone(),
                    args: arg_vals,
                    dest: dest.clone(),
                });

                Ok((instructions, dest))
            }
            Expr::PostfixInc(expr) => self.gen_postfix(expr, tacky::BinaryOp::Add),
            Expr::PostfixDec(expr) => self.gen_postfix(expr, tacky::BinaryOp::Subtract),
        }
    }

    /// `x++` / `x--`: the expression's value is the variable before the bump
    fn gen_postfix(
        &mut self,
        expr: &Expr,
        op: tacky::BinaryOp,
    ) -> SemanticResult<(Vec<Instruction>, Val)> {
        let name = match expr {
            Expr::Var(name) => name,
            _ => unreachable!("Internal Error: postfix operand should always be a Var"),
        };

        let unique = self.resolve_var(name)?;
        let var = Val::Var(unique);
        let ty = self.val_type(&var);

        let old = self.make_temp(&ty);
        let one = Val::Constant(const_convert(&ty, Constant::Int(1)));

        let instructions = vec![
            Instruction::Copy {
                src: var.clone(),
                dest: old.clone(),
            },
            Instruction::Binary {
                op,
                first: var.clone(),
                second: one,
                dest: var,
            },
        ];

        Ok((instructions, old))
    }

    /// Resolution order: static locals shadow locals shadow file scope
    fn resolve_var(&self, name: &str) -> SemanticResult<String> {
        if let Some(unique) = self.static_locals.get(name) {
            return Ok(unique.clone());
        }

        if let Some(unique) = self.locals.get(name) {
            return Ok(unique.clone());
        }

        match self.symbols.get(name) {
            Some(ty::Symbol {
                attrs: ty::IdentifierAttr::Static { .. },
                ..
            }) => Ok(name.to_string()),
            _ => Err(SemErr::UndeclaredVariable(name.to_string())),
        }
    }

    fn val_type(&self, val: &Val) -> Type {
        match val {
            Val::Constant(c) => c.ty(),
            Val::Var(name) => match self.var_types.get(name) {
                Some(ty) => ty.clone(),
                None => match self.symbols.get(name) {
                    Some(symbol) => symbol.t.clone(),
                    None => unreachable!("Internal Error: no type recorded for '{}'", name),
                },
            },
        }
    }

    /// Makes `val` carry the target type: constants are converted in place,
    /// everything else goes through a width-converting Copy into a fresh
    /// temporary
    fn convert_to(&mut self, instructions: &mut Vec<Instruction>, val: Val, target: &Type) -> Val {
        if self.val_type(&val) == *target {
            return val;
        }

        if let Val::Constant(c) = val {
            return Val::Constant(const_convert(target, c));
        }

        let dest = self.make_temp(target);
        instructions.push(Instruction::Copy {
            src: val,
            dest: dest.clone(),
        });

        dest
    }

    /// Constants assigned across widths are converted at compile time; a
    /// variable source is left for the width-converting Copy itself
    fn coerce_constant(&self, val: Val, target: &Type) -> Val {
        match val {
            Val::Constant(c) => Val::Constant(const_convert(target, c)),
            Val::Var(_) => val,
        }
    }

    fn rename_local(&mut self, name: &str, ty: &Type) -> String {
        let unique = format!("{}.{}", name, self.var_counter);
        self.var_counter += 1;

        self.locals.insert(name.to_string(), unique.clone());
        self.var_types.insert(unique.clone(), ty.clone());

        unique
    }

    fn make_temp(&mut self, ty: &Type) -> Val {
        let name = format!("tmp.{}", self.var_counter);
        self.var_counter += 1;

        self.var_types.insert(name.clone(), ty.clone());

        Val::Var(name)
    }

    fn make_label(&mut self, suffix: &str) -> String {
        let label = format!("L.{}_{}", self.label_counter, suffix);
        self.label_counter += 1;

        label
    }
}

impl Default for TackyGen {
    fn default() -> Self {
        Self::new()
    }
}

fn gen_unop(op: UnaryOp) -> tacky::UnaryOp {
    match op {
        UnaryOp::Complement => tacky::UnaryOp::Complement,
        UnaryOp::Negate => tacky::UnaryOp::Negate,
        UnaryOp::Not => unreachable!("Internal Error: Not is lowered separately"),
    }
}

fn is_comparison(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual
    )
}

/// Picks the signed or unsigned TACKY variant from the common type
fn gen_typed_binop(op: BinaryOp, common: &Type) -> tacky::BinaryOp {
    let signed = common.is_signed();

    match op {
        BinaryOp::Add => tacky::BinaryOp::Add,
        BinaryOp::Subtract => tacky::BinaryOp::Subtract,
        BinaryOp::Multiply => tacky::BinaryOp::Multiply,
        BinaryOp::Divide => {
            if signed {
                tacky::BinaryOp::Divide
            } else {
                tacky::BinaryOp::DivideUnsigned
            }
        }
        BinaryOp::Modulo => {
            if signed {
                tacky::BinaryOp::Modulo
            } else {
                tacky::BinaryOp::ModuloUnsigned
            }
        }

        BinaryOp::Equal => tacky::BinaryOp::Equal,
        BinaryOp::NotEqual => tacky::BinaryOp::NotEqual,
        BinaryOp::Less => {
            if signed {
                tacky::BinaryOp::Less
            } else {
                tacky::BinaryOp::LessUnsigned
            }
        }
        BinaryOp::LessEqual => {
            if signed {
                tacky::BinaryOp::LessEqual
            } else {
                tacky::BinaryOp::LessEqualUnsigned
            }
        }
        BinaryOp::Greater => {
            if signed {
                tacky::BinaryOp::Greater
            } else {
                tacky::BinaryOp::GreaterUnsigned
            }
        }
        BinaryOp::GreaterEqual => {
            if signed {
                tacky::BinaryOp::GreaterEqual
            } else {
                tacky::BinaryOp::GreaterEqualUnsigned
            }
        }

        BinaryOp::BitwiseAnd => tacky::BinaryOp::BitwiseAnd,
        BinaryOp::BitwiseOr => tacky::BinaryOp::BitwiseOr,
        BinaryOp::BitwiseXor => tacky::BinaryOp::BitwiseXor,

        BinaryOp::BitshiftLeft | BinaryOp::BitshiftRight => {
            unreachable!("Internal Error: shifts are lowered separately")
        }
        BinaryOp::And | BinaryOp::Or => {
            unreachable!("Internal Error: cannot convert {:?} directly to TACKY", op)
        }
    }
}

#[cfg(test)]
mod tests {
    use lexer::Lexer;
    use parser::Parser;

    use super::*;

    fn lower(src: &str) -> tacky::TranslationUnit {
        let tokens = Lexer::new(src).tokenize().collect();
        let ast = Parser::new(tokens).parse().unwrap();
        gen_tacky(&ast).unwrap()
    }

    fn lower_err(src: &str) -> SemErr {
        let tokens = Lexer::new(src).tokenize().collect();
        let ast = Parser::new(tokens).parse().unwrap();
        gen_tacky(&ast).unwrap_err()
    }

    #[test]
    fn trailing_return_zero_is_appended() {
        let tacky = lower("int main(void) { return 2; }");
        let main = &tacky.funcs[0];

        assert_eq!(
            main.instructions.last(),
            Some(&Instruction::Return(Val::Constant(Constant::Int(0))))
        );
    }

    #[test]
    fn undeclared_variable() {
        assert_eq!(
            lower_err("int main(void) { return x; }"),
            SemErr::UndeclaredVariable("x".to_string())
        );
    }

    #[test]
    fn variable_redefinition() {
        assert_eq!(
            lower_err("int main(void) { int a = 1; int a = 2; return a; }"),
            SemErr::VariableRedefinition("a".to_string())
        );
    }

    #[test]
    fn break_outside_loop() {
        assert_eq!(
            lower_err("int main(void) { break; }"),
            SemErr::BreakOutsideLoop
        );
    }

    #[test]
    fn continue_outside_loop() {
        assert_eq!(
            lower_err("int main(void) { continue; }"),
            SemErr::ContinueOutsideLoop
        );
    }

    #[test]
    fn undeclared_function() {
        assert_eq!(
            lower_err("int main(void) { return foo(); }"),
            SemErr::UndeclaredFunction("foo".to_string())
        );
    }

    #[test]
    fn calls_resolve_in_order_of_definition() {
        // `bar` is only defined after `main`, so the call cannot see it
        assert_eq!(
            lower_err("int main(void) { return bar(); } int bar(void) { return 1; }"),
            SemErr::UndeclaredFunction("bar".to_string())
        );
    }

    #[test]
    fn wrong_argument_count() {
        assert_eq!(
            lower_err(
                "int add(int a, int b) { return a + b; } int main(void) { return add(1); }"
            ),
            SemErr::WrongArgumentCount {
                name: "add".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn function_redefinition() {
        assert_eq!(
            lower_err("int foo(void) { return 1; } int foo(void) { return 2; }"),
            SemErr::FunctionRedefinition("foo".to_string())
        );
    }

    #[test]
    fn non_constant_initializer() {
        assert_eq!(
            lower_err("int main(void) { static int x = main(); return x; }"),
            SemErr::NonConstantInitializer("x".to_string())
        );
    }

    #[test]
    fn file_scope_initializer_is_folded() {
        let tacky = lower("int x = 2 + 3 * 4; int main(void) { return x; }");

        assert_eq!(tacky.statics.len(), 1);
        assert_eq!(tacky.statics[0].name, "x");
        assert_eq!(tacky.statics[0].init, Some(Constant::Int(14)));
        assert!(!tacky.statics[0].is_static);
    }

    #[test]
    fn long_initializer_keeps_width() {
        let tacky = lower("long x = 4294967296 + 10; int main(void) { return 0; }");

        assert_eq!(tacky.statics[0].init, Some(Constant::Long(4294967306)));
    }

    #[test]
    fn int_initializer_truncates() {
        let tacky = lower("int x = 4294967296 + 10; int main(void) { return 0; }");

        assert_eq!(tacky.statics[0].init, Some(Constant::Int(10)));
    }

    #[test]
    fn static_local_becomes_a_global() {
        let tacky = lower("int foo(void) { static int x = 5; x = x + 1; return x; } int main(void) { return foo(); }");

        assert_eq!(tacky.statics.len(), 1);
        assert!(tacky.statics[0].name.starts_with("x.static."));
        assert_eq!(tacky.statics[0].init, Some(Constant::Int(5)));
        assert!(tacky.statics[0].is_static);
    }

    #[test]
    fn mixed_width_operands_are_promoted() {
        let tacky = lower("int main(void) { long l = 10; int i = 3; l = l + i; return 0; }");
        let main = &tacky.funcs[0];

        // the int operand is widened through a Copy into a long temporary
        let has_widening_copy = main.instructions.iter().any(|instr| match instr {
            Instruction::Copy {
                src: Val::Var(src),
                dest: Val::Var(dest),
            } => {
                main.var_types.get(src) == Some(&Type::Int)
                    && main.var_types.get(dest) == Some(&Type::Long)
            }
            _ => false,
        });
        assert!(has_widening_copy);

        // and the addition's destination temporary is long
        let add_dest_is_long = main.instructions.iter().any(|instr| match instr {
            Instruction::Binary {
                op: tacky::BinaryOp::Add,
                dest: Val::Var(dest),
                ..
            } => main.var_types.get(dest) == Some(&Type::Long),
            _ => false,
        });
        assert!(add_dest_is_long);
    }

    #[test]
    fn comparison_results_are_int() {
        let tacky = lower("int main(void) { long l = 1; if (l < 2) return 1; return 0; }");
        let main = &tacky.funcs[0];

        let cmp_dest_is_int = main.instructions.iter().any(|instr| match instr {
            Instruction::Binary {
                op: tacky::BinaryOp::Less,
                dest: Val::Var(dest),
                ..
            } => main.var_types.get(dest) == Some(&Type::Int),
            _ => false,
        });
        assert!(cmp_dest_is_int);
    }

    #[test]
    fn unsigned_operands_use_unsigned_ops() {
        let tacky = lower(
            "int main(void) { unsigned int a = 10; unsigned int b = 3; if (a / b < 4) return a % b; return 0; }",
        );
        let main = &tacky.funcs[0];

        let ops: Vec<_> = main
            .instructions
            .iter()
            .filter_map(|instr| match instr {
                Instruction::Binary { op, .. } => Some(*op),
                _ => None,
            })
            .collect();

        assert!(ops.contains(&tacky::BinaryOp::DivideUnsigned));
        assert!(ops.contains(&tacky::BinaryOp::ModuloUnsigned));
        assert!(ops.contains(&tacky::BinaryOp::LessUnsigned));
    }

    #[test]
    fn shift_takes_left_operand_type() {
        let tacky = lower("int main(void) { unsigned long x = 8; x = x >> 2; return 0; }");
        let main = &tacky.funcs[0];

        let shift = main.instructions.iter().find_map(|instr| match instr {
            Instruction::Binary {
                op: op @ tacky::BinaryOp::BitshiftRightUnsigned,
                dest: Val::Var(dest),
                ..
            } => Some((*op, dest.clone())),
            _ => None,
        });

        let (_, dest) = shift.expect("expected an unsigned right shift");
        assert_eq!(main.var_types.get(&dest), Some(&Type::ULong));
    }

    #[test]
    fn labels_are_unique_and_jumps_resolve() {
        let tacky = lower(
            "int main(void) { int i; for (i = 0; i < 10; i = i + 1) { if (i == 5) break; } while (i) i = i - 1; do i = i + 1; while (i < 3); return i && 1 || 0; }",
        );
        let main = &tacky.funcs[0];

        let mut labels = std::collections::HashSet::new();
        for instr in &main.instructions {
            if let Instruction::Label(name) = instr {
                assert!(labels.insert(name.clone()), "duplicate label {}", name);
            }
        }

        for instr in &main.instructions {
            let target = match instr {
                Instruction::Jump { target } => Some(target),
                Instruction::JumpIfZero { target, .. } => Some(target),
                Instruction::JumpIfNotZero { target, .. } => Some(target),
                _ => None,
            };

            if let Some(target) = target {
                assert!(labels.contains(target), "jump to undefined label {}", target);
            }
        }
    }

    #[test]
    fn arguments_are_converted_to_parameter_types() {
        let tacky = lower(
            "long widen(long x) { return x; } int main(void) { int a = 3; return widen(a) > 0; }",
        );
        let main = &tacky.funcs[1];

        let call_args = main.instructions.iter().find_map(|instr| match instr {
            Instruction::FunCall { args, .. } => Some(args.clone()),
            _ => None,
        });

        let args = call_args.expect("expected a call");
        match &args[0] {
            Val::Var(name) => assert_eq!(main.var_types.get(name), Some(&Type::Long)),
            Val::Constant(_) => panic!("argument should be a widened temporary"),
        }
    }

    #[test]
    fn params_are_renamed_and_typed() {
        let tacky = lower("int add(int a, long b) { return a; } int main(void) { return 0; }");
        let add = &tacky.funcs[0];

        assert_eq!(add.params.len(), 2);
        assert!(add.params[0].starts_with("a."));
        assert!(add.params[1].starts_with("b."));
        assert_eq!(add.var_types.get(&add.params[0]), Some(&Type::Int));
        assert_eq!(add.var_types.get(&add.params[1]), Some(&Type::Long));
    }
}
