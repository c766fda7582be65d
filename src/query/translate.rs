use std::fmt::Write;

use crate::arguments::{SqliteArgumentValue, SqliteArguments};
use crate::error::{Error, Result};
use crate::options::StorageOptions;
use crate::query::expr::{BinaryOp, Expr, Func, ScalarValue, UnaryOp};
use crate::schema::{quote_identifier, sanitize_identifier};

/// The output of predicate translation: a SQL fragment and the closed-over
/// values it refers to, in positional order.
///
/// No closed-over value ever appears in the SQL text; every one is a
/// numbered placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub sql: String,
    pub params: Vec<ScalarValue>,
}

impl Translated {
    /// Encode the parameters for binding, using the connection's storage
    /// options.
    pub(crate) fn arguments(&self, options: &StorageOptions) -> Result<SqliteArguments> {
        let mut arguments = SqliteArguments::new();

        for (i, param) in self.params.iter().enumerate() {
            let outcome = match param {
                ScalarValue::Null => {
                    arguments.push(SqliteArgumentValue::Null);
                    Ok(())
                }
                ScalarValue::Bool(v) => arguments.add(v, options),
                ScalarValue::Int(v) => arguments.add(v, options),
                ScalarValue::Real(v) => arguments.add(v, options),
                ScalarValue::Text(v) => arguments.add(v, options),
                ScalarValue::Blob(v) => arguments.add(v, options),
                ScalarValue::Uuid(v) => arguments.add(v, options),
                ScalarValue::Decimal(v) => arguments.add(v, options),
                ScalarValue::DateTime(v) => arguments.add(v, options),
                ScalarValue::Duration(v) => arguments.add(v, options),
            };

            outcome.map_err(|source| Error::Bind { index: i + 1, source })?;
        }

        Ok(arguments)
    }
}

/// Translate a predicate expression into a parameterized SQL fragment.
///
/// Subtrees that refer only to closed-over values are folded host-side and
/// surface as single parameters; subtrees over record columns become SQL
/// with explicit parentheses preserving the tree's precedence.
pub fn translate(expr: &Expr, options: &StorageOptions) -> Result<Translated> {
    let mut translator =
        Translator { options, sql: String::new(), params: Vec::new() };

    translator.emit(expr)?;

    Ok(Translated { sql: translator.sql, params: translator.params })
}

struct Translator<'o> {
    options: &'o StorageOptions,
    sql: String,
    params: Vec<ScalarValue>,
}

impl Translator<'_> {
    fn push_param(&mut self, value: ScalarValue) {
        self.params.push(value);
        // numbered placeholders keep the fragment stable under rebinding
        let _ = write!(self.sql, "?{}", self.params.len());
    }

    fn emit(&mut self, expr: &Expr) -> Result<()> {
        if !expr.refers_to_column() {
            let value = fold(expr)?;
            self.push_param(value);
            return Ok(());
        }

        match expr {
            Expr::Column(name) => {
                self.sql.push_str(&quote_identifier(&sanitize_identifier(name)));
            }

            // closed; handled above
            Expr::Value(_) => unreachable!(),

            Expr::Unary(UnaryOp::Not, a) => {
                self.sql.push_str("NOT (");
                self.emit(a)?;
                self.sql.push(')');
            }

            Expr::Unary(UnaryOp::Neg, a) => {
                self.sql.push_str("-(");
                self.emit(a)?;
                self.sql.push(')');
            }

            Expr::Binary(op, a, b) => self.emit_binary(*op, a, b)?,

            Expr::Coalesce(a, b) => {
                self.sql.push_str("COALESCE(");
                self.emit(a)?;
                self.sql.push_str(", ");
                self.emit(b)?;
                self.sql.push(')');
            }

            Expr::IsNull(a, negated) => {
                self.sql.push('(');
                self.emit(a)?;
                self.sql.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
                self.sql.push(')');
            }

            Expr::Call(func, args) => self.emit_call(*func, args)?,

            Expr::InList(a, values) => {
                if values.is_empty() {
                    // membership in an empty sequence is vacuously false
                    self.sql.push('0');
                    return Ok(());
                }

                self.sql.push('(');
                self.emit(a)?;
                self.sql.push_str(" IN (");

                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.push_param(value.clone());
                }

                self.sql.push_str("))");
            }

            Expr::Case { cond, then, els } => {
                self.sql.push_str("CASE WHEN ");
                self.emit(cond)?;
                self.sql.push_str(" THEN ");
                self.emit(then)?;
                self.sql.push_str(" ELSE ");
                self.emit(els)?;
                self.sql.push_str(" END");
            }
        }

        Ok(())
    }

    fn emit_binary(&mut self, op: BinaryOp, a: &Expr, b: &Expr) -> Result<()> {
        // comparisons against a closed null become IS [NOT] NULL
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            for (open, closed) in [(a, b), (b, a)] {
                if !closed.refers_to_column() && fold(closed)?.is_null() {
                    self.sql.push('(');
                    self.emit(open)?;
                    self.sql.push_str(if op == BinaryOp::Eq { " IS NULL" } else { " IS NOT NULL" });
                    self.sql.push(')');
                    return Ok(());
                }
            }
        }

        let sql_op = match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",

            // boolean exclusive-or: true exactly when the operands differ
            BinaryOp::Xor => "<>",
        };

        let nocase = matches!(op, BinaryOp::Eq | BinaryOp::Ne)
            && self.options.case_insensitive_text
            && (is_text_constant(a) || is_text_constant(b));

        self.sql.push('(');
        self.emit(a)?;
        let _ = write!(self.sql, " {sql_op} ");
        self.emit(b)?;

        if nocase {
            self.sql.push_str(" COLLATE NOCASE");
        }

        self.sql.push(')');

        Ok(())
    }

    fn emit_call(&mut self, func: Func, args: &[Expr]) -> Result<()> {
        let arity = match func {
            Func::StartsWith | Func::EndsWith | Func::Contains => 2,
            Func::Substr => 3,
            _ => 1,
        };

        if args.len() != arity {
            return Err(Error::UntranslatableExpression("call with wrong arity"));
        }

        match func {
            Func::StartsWith => {
                self.sql.push('(');
                self.emit(&args[0])?;
                self.sql.push_str(" LIKE ");
                self.emit(&args[1])?;
                self.sql.push_str(" || '%')");
            }

            Func::EndsWith => {
                self.sql.push('(');
                self.emit(&args[0])?;
                self.sql.push_str(" LIKE '%' || ");
                self.emit(&args[1])?;
                self.sql.push(')');
            }

            Func::Contains => {
                self.sql.push('(');
                self.emit(&args[0])?;
                self.sql.push_str(" LIKE '%' || ");
                self.emit(&args[1])?;
                self.sql.push_str(" || '%')");
            }

            Func::ToLower | Func::ToUpper | Func::Trim | Func::Length => {
                self.sql.push_str(match func {
                    Func::ToLower => "LOWER(",
                    Func::ToUpper => "UPPER(",
                    Func::Trim => "TRIM(",
                    Func::Length => "LENGTH(",
                    _ => unreachable!(),
                });
                self.emit(&args[0])?;
                self.sql.push(')');
            }

            Func::Substr => {
                // host offsets are 0-based, SQL substr is 1-based
                self.sql.push_str("SUBSTR(");
                self.emit(&args[0])?;
                self.sql.push_str(", ");
                self.emit(&args[1])?;
                self.sql.push_str(" + 1, ");
                self.emit(&args[2])?;
                self.sql.push(')');
            }
        }

        Ok(())
    }
}

fn is_text_constant(expr: &Expr) -> bool {
    !expr.refers_to_column() && matches!(fold(expr), Ok(ScalarValue::Text(_)))
}

/// Evaluate a closed subtree host-side.
fn fold(expr: &Expr) -> Result<ScalarValue> {
    use ScalarValue as V;

    Ok(match expr {
        Expr::Value(v) => v.clone(),

        Expr::Column(_) => {
            return Err(Error::UntranslatableExpression("column reference in closed subtree"));
        }

        Expr::Unary(UnaryOp::Not, a) => match fold(a)? {
            V::Null => V::Null,
            V::Bool(b) => V::Bool(!b),
            _ => return Err(Error::UntranslatableExpression("logical not on non-boolean constant")),
        },

        Expr::Unary(UnaryOp::Neg, a) => match fold(a)? {
            V::Null => V::Null,
            V::Int(i) => V::Int(-i),
            V::Real(r) => V::Real(-r),
            V::Decimal(d) => V::Decimal(-d),
            V::Duration(d) => V::Duration(-d),
            _ => return Err(Error::UntranslatableExpression("negation on non-numeric constant")),
        },

        Expr::Binary(op, a, b) => fold_binary(*op, fold(a)?, fold(b)?)?,

        Expr::Coalesce(a, b) => {
            let a = fold(a)?;
            if a.is_null() {
                fold(b)?
            } else {
                a
            }
        }

        Expr::IsNull(a, negated) => V::Bool(fold(a)?.is_null() != *negated),

        Expr::Call(func, args) => fold_call(*func, args)?,

        Expr::InList(a, values) => V::Bool(values.contains(&fold(a)?)),

        Expr::Case { cond, then, els } => match fold(cond)? {
            V::Bool(true) => fold(then)?,
            V::Bool(false) | V::Null => fold(els)?,
            _ => return Err(Error::UntranslatableExpression("non-boolean condition constant")),
        },
    })
}

fn fold_binary(op: BinaryOp, a: ScalarValue, b: ScalarValue) -> Result<ScalarValue> {
    use BinaryOp::*;
    use ScalarValue as V;

    // null propagates through arithmetic; equality treats it as a value
    if (a.is_null() || b.is_null()) && matches!(op, Add | Sub | Mul | Div | Rem) {
        return Ok(V::Null);
    }

    Ok(match (op, a, b) {
        (Add, V::Int(a), V::Int(b)) => V::Int(
            a.checked_add(b).ok_or(Error::UntranslatableExpression("integer overflow"))?,
        ),
        (Sub, V::Int(a), V::Int(b)) => V::Int(
            a.checked_sub(b).ok_or(Error::UntranslatableExpression("integer overflow"))?,
        ),
        (Mul, V::Int(a), V::Int(b)) => V::Int(
            a.checked_mul(b).ok_or(Error::UntranslatableExpression("integer overflow"))?,
        ),
        (Div, V::Int(a), V::Int(b)) => V::Int(
            a.checked_div(b).ok_or(Error::UntranslatableExpression("division by zero"))?,
        ),
        (Rem, V::Int(a), V::Int(b)) => V::Int(
            a.checked_rem(b).ok_or(Error::UntranslatableExpression("division by zero"))?,
        ),

        (Add, a, b) if numeric(&a) && numeric(&b) => V::Real(real(a) + real(b)),
        (Sub, a, b) if numeric(&a) && numeric(&b) => V::Real(real(a) - real(b)),
        (Mul, a, b) if numeric(&a) && numeric(&b) => V::Real(real(a) * real(b)),
        (Div, a, b) if numeric(&a) && numeric(&b) => V::Real(real(a) / real(b)),
        (Rem, a, b) if numeric(&a) && numeric(&b) => V::Real(real(a) % real(b)),

        (Add, V::Text(a), V::Text(b)) => V::Text(a + &b),

        (Eq, a, b) => V::Bool(a == b),
        (Ne, a, b) => V::Bool(a != b),

        (Lt, V::Int(a), V::Int(b)) => V::Bool(a < b),
        (Le, V::Int(a), V::Int(b)) => V::Bool(a <= b),
        (Gt, V::Int(a), V::Int(b)) => V::Bool(a > b),
        (Ge, V::Int(a), V::Int(b)) => V::Bool(a >= b),

        (Lt, a, b) if numeric(&a) && numeric(&b) => V::Bool(real(a) < real(b)),
        (Le, a, b) if numeric(&a) && numeric(&b) => V::Bool(real(a) <= real(b)),
        (Gt, a, b) if numeric(&a) && numeric(&b) => V::Bool(real(a) > real(b)),
        (Ge, a, b) if numeric(&a) && numeric(&b) => V::Bool(real(a) >= real(b)),

        (Lt, V::Text(a), V::Text(b)) => V::Bool(a < b),
        (Le, V::Text(a), V::Text(b)) => V::Bool(a <= b),
        (Gt, V::Text(a), V::Text(b)) => V::Bool(a > b),
        (Ge, V::Text(a), V::Text(b)) => V::Bool(a >= b),

        (And, V::Bool(a), V::Bool(b)) => V::Bool(a && b),
        (Or, V::Bool(a), V::Bool(b)) => V::Bool(a || b),
        (Xor, V::Bool(a), V::Bool(b)) => V::Bool(a != b),

        _ => return Err(Error::UntranslatableExpression("operands unsupported for operator")),
    })
}

fn numeric(v: &ScalarValue) -> bool {
    matches!(v, ScalarValue::Int(_) | ScalarValue::Real(_))
}

fn real(v: ScalarValue) -> f64 {
    match v {
        ScalarValue::Int(i) => i as f64,
        ScalarValue::Real(r) => r,
        _ => unreachable!(),
    }
}

fn fold_call(func: Func, args: &[Expr]) -> Result<ScalarValue> {
    use ScalarValue as V;

    let text = |expr: &Expr| -> Result<String> {
        match fold(expr)? {
            V::Text(s) => Ok(s),
            _ => Err(Error::UntranslatableExpression("string call on non-string constant")),
        }
    };

    Ok(match func {
        Func::StartsWith => V::Bool(text(&args[0])?.starts_with(&text(&args[1])?)),
        Func::EndsWith => V::Bool(text(&args[0])?.ends_with(&text(&args[1])?)),
        Func::Contains => V::Bool(text(&args[0])?.contains(&text(&args[1])?)),
        Func::ToLower => V::Text(text(&args[0])?.to_lowercase()),
        Func::ToUpper => V::Text(text(&args[0])?.to_uppercase()),
        Func::Trim => V::Text(text(&args[0])?.trim().to_owned()),
        Func::Length => V::Int(text(&args[0])?.chars().count() as i64),

        Func::Substr => {
            let s = text(&args[0])?;

            let index = |expr: &Expr| -> Result<usize> {
                match fold(expr)? {
                    V::Int(i) if i >= 0 => Ok(i as usize),
                    _ => Err(Error::UntranslatableExpression("substring bound must be a non-negative integer")),
                }
            };

            let start = index(&args[1])?;
            let len = index(&args[2])?;

            V::Text(s.chars().skip(start).take(len).collect())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::{col, val};

    fn options() -> StorageOptions {
        StorageOptions::default()
    }

    #[test]
    fn comparison_and_call_with_parameters() {
        let closure_value = 21_i64;

        let expr = col("Age")
            .gt(val(closure_value))
            .and(col("Name").starts_with(val("A")));

        let t = translate(&expr, &options()).unwrap();

        assert_eq!(t.sql, "((\"Age\" > ?1) AND (\"Name\" LIKE ?2 || '%'))");
        assert_eq!(t.params, vec![ScalarValue::Int(21), ScalarValue::Text("A".into())]);
    }

    #[test]
    fn quoted_values_never_reach_the_sql_text() {
        let expr = col("Name").eq(val("O'Reilly")).and(col("Age").ge(val(30_i64)));

        let t = translate(&expr, &options()).unwrap();

        assert!(!t.sql.contains("O'Reilly"));
        assert_eq!(t.params.len(), 2);
        assert_eq!(t.sql, "((\"Name\" = ?1) AND (\"Age\" >= ?2))");
    }

    #[test]
    fn closed_subtrees_fold_to_one_parameter() {
        // (7 + 14) only closes over host values: one parameter, no literals
        let expr = col("Age").gt(val(7_i64).add(val(14_i64)));

        let t = translate(&expr, &options()).unwrap();

        assert_eq!(t.sql, "(\"Age\" > ?1)");
        assert_eq!(t.params, vec![ScalarValue::Int(21)]);
    }

    #[test]
    fn null_comparison_uses_is_null() {
        let t = translate(&col("Age").eq(val(None::<i64>)), &options()).unwrap();
        assert_eq!(t.sql, "(\"Age\" IS NULL)");
        assert!(t.params.is_empty());

        let t = translate(&col("Age").ne(val(None::<i64>)), &options()).unwrap();
        assert_eq!(t.sql, "(\"Age\" IS NOT NULL)");
    }

    #[test]
    fn case_insensitive_equality_collates() {
        let mut options = options();
        options.case_insensitive_text = true;

        let t = translate(&col("Name").eq(val("alice")), &options).unwrap();

        assert_eq!(t.sql, "(\"Name\" = ?1 COLLATE NOCASE)");
    }

    #[test]
    fn sequence_membership_renders_in() {
        let expr = col("Age").in_list([18_i64, 21, 30]);

        let t = translate(&expr, &options()).unwrap();

        assert_eq!(t.sql, "(\"Age\" IN (?1, ?2, ?3))");
        assert_eq!(t.params.len(), 3);
    }

    #[test]
    fn conditional_renders_case() {
        let expr = col("Flag")
            .eq(val(1_i64))
            .if_then_else(col("A"), col("B"))
            .eq(val("x"));

        let t = translate(&expr, &options()).unwrap();

        assert_eq!(t.sql, "(CASE WHEN (\"Flag\" = ?1) THEN \"A\" ELSE \"B\" END = ?2)");
    }

    #[test]
    fn column_names_are_sanitized_and_escaped() {
        let t = translate(&col("first name").eq(val(1_i64)), &options()).unwrap();

        assert_eq!(t.sql, "(\"firstName\" = ?1)");
    }

    #[test]
    fn substring_accounts_for_sql_indexing() {
        let t = translate(&col("Name").substr(val(0_i64), val(3_i64)).eq(val("abc")), &options())
            .unwrap();

        assert_eq!(t.sql, "(SUBSTR(\"Name\", ?1 + 1, ?2) = ?3)");
    }
}
