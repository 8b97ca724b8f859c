use std::fmt::{self, Display};

use sheetcalc_common::{LiteralValue, col_to_letters};

/// A reference to something outside the cell.
///
/// Rows and columns are one-based, as written in A1 notation.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum ReferenceType {
    Cell {
        sheet: Option<String>,
        row: u32,
        col: u32,
    },
    Range {
        sheet: Option<String>,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    },
    NamedRange(String),
}

impl Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a1 = |row: u32, col: u32| format!("{}{row}", col_to_letters(col.saturating_sub(1)));
        match self {
            ReferenceType::Cell { sheet, row, col } => {
                if let Some(sheet) = sheet {
                    write!(f, "{sheet}!")?;
                }
                f.write_str(&a1(*row, *col))
            }
            ReferenceType::Range {
                sheet,
                start_row,
                start_col,
                end_row,
                end_col,
            } => {
                if let Some(sheet) = sheet {
                    write!(f, "{sheet}!")?;
                }
                write!(f, "{}:{}", a1(*start_row, *start_col), a1(*end_row, *end_col))
            }
            ReferenceType::NamedRange(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Percent,
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Percent => "%",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Concat => "&",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
        })
    }
}

/// The different types of AST nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNodeType {
    Literal(LiteralValue),
    Reference {
        original: String, // As written, kept for display/debugging
        reference: ReferenceType,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<ASTNode>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<ASTNode>,
        right: Box<ASTNode>,
    },
    Function {
        name: String,
        args: Vec<ASTNode>,
    },
    /// An omitted argument, as in `IF(A1,,2)`.
    Missing,
}

/// An AST node represents a parsed formula element
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub node_type: ASTNodeType,
}

impl ASTNode {
    pub fn new(node_type: ASTNodeType) -> Self {
        ASTNode { node_type }
    }

    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::new(ASTNodeType::Literal(value.into()))
    }

    pub fn number(n: f64) -> Self {
        Self::new(ASTNodeType::Literal(LiteralValue::Number(n)))
    }

    pub fn text(s: &str) -> Self {
        Self::new(ASTNodeType::Literal(LiteralValue::Text(s.to_string())))
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(ASTNodeType::Literal(LiteralValue::Boolean(b)))
    }

    pub fn missing() -> Self {
        Self::new(ASTNodeType::Missing)
    }

    pub fn reference(reference: ReferenceType) -> Self {
        Self::new(ASTNodeType::Reference {
            original: reference.to_string(),
            reference,
        })
    }

    /// One-based cell reference on the formula's own sheet.
    pub fn cell(row: u32, col: u32) -> Self {
        Self::reference(ReferenceType::Cell {
            sheet: None,
            row,
            col,
        })
    }

    pub fn sheet_cell(sheet: &str, row: u32, col: u32) -> Self {
        Self::reference(ReferenceType::Cell {
            sheet: Some(sheet.to_string()),
            row,
            col,
        })
    }

    /// One-based, inclusive range on the formula's own sheet.
    pub fn range(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::reference(ReferenceType::Range {
            sheet: None,
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    pub fn name(name: &str) -> Self {
        Self::reference(ReferenceType::NamedRange(name.to_string()))
    }

    pub fn unary(op: UnaryOperator, expr: ASTNode) -> Self {
        Self::new(ASTNodeType::UnaryOp {
            op,
            expr: Box::new(expr),
        })
    }

    pub fn binary(op: BinaryOperator, left: ASTNode, right: ASTNode) -> Self {
        Self::new(ASTNodeType::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn function(name: &str, args: Vec<ASTNode>) -> Self {
        Self::new(ASTNodeType::Function {
            name: name.to_string(),
            args,
        })
    }

    /// Every reference mentioned in the tree, in evaluation order.
    pub fn references(&self) -> Vec<&ReferenceType> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a ReferenceType>) {
        match &self.node_type {
            ASTNodeType::Reference { reference, .. } => out.push(reference),
            ASTNodeType::UnaryOp { expr, .. } => expr.collect_references(out),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.collect_references(out);
                right.collect_references(out);
            }
            ASTNodeType::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(out);
                }
            }
            ASTNodeType::Literal(_) | ASTNodeType::Missing => {}
        }
    }
}

/// Renders formula text without the leading `=`.
impl Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_type {
            ASTNodeType::Literal(LiteralValue::Text(s)) => {
                write!(f, "\"{}\"", s.replace('"', "\"\""))
            }
            ASTNodeType::Literal(v) => write!(f, "{v}"),
            ASTNodeType::Reference { original, .. } => f.write_str(original),
            ASTNodeType::UnaryOp {
                op: UnaryOperator::Percent,
                expr,
            } => write!(f, "{expr}%"),
            ASTNodeType::UnaryOp { op, expr } => write!(f, "{op}{expr}"),
            ASTNodeType::BinaryOp { op, left, right } => write!(f, "({left}{op}{right})"),
            ASTNodeType::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ASTNodeType::Missing => Ok(()),
        }
    }
}
