//! Stack-machine evaluation of a postfix query plan.

use boolsearch_common::{Result, error::Error};

use crate::{
    query::{
        parser::{QueryOp, QueryPlan},
        set_ops,
    },
    read::InvertedIndex,
};

/// Where the evaluator gets posting lists from.
pub trait PostingSource {
    /// Size of the document universe; ids are in `[0, doc_count)`.
    fn doc_count(&self) -> u32;

    /// Sorted ids of the documents containing `term`; empty when unknown.
    fn posting_list(&self, term: &str) -> Result<Vec<u32>>;
}

impl PostingSource for InvertedIndex {
    fn doc_count(&self) -> u32 {
        InvertedIndex::doc_count(self)
    }

    fn posting_list(&self, term: &str) -> Result<Vec<u32>> {
        InvertedIndex::posting_list(self, term)
    }
}

fn pop_operand(stack: &mut Vec<Vec<u32>>, operator: &'static str) -> Result<Vec<u32>> {
    stack.pop().ok_or_else(|| Error::missing_operand(operator))
}

/// Executes `plan` and returns the matching ids in ascending order.
///
/// Fails with `MissingOperand` when an operator finds too few operands and
/// with `MalformedQuery` unless exactly one set remains at the end (which
/// also rejects the empty plan).
pub fn evaluate<S>(plan: &QueryPlan, source: &S) -> Result<Vec<u32>>
where
    S: ?Sized + PostingSource,
{
    let mut stack: Vec<Vec<u32>> = Vec::new();
    for op in &plan.ops {
        let result = match op {
            QueryOp::Term(term) => source.posting_list(term)?,
            QueryOp::And | QueryOp::Or => {
                let name = if *op == QueryOp::And { "AND" } else { "OR" };
                if stack.len() < 2 {
                    return Err(Error::missing_operand(name));
                }
                let b = pop_operand(&mut stack, name)?;
                let a = pop_operand(&mut stack, name)?;
                if *op == QueryOp::And {
                    set_ops::intersect(&a, &b)
                } else {
                    set_ops::union(&a, &b)
                }
            }
            QueryOp::Not => {
                let a = pop_operand(&mut stack, "NOT")?;
                set_ops::complement(&a, source.doc_count())
            }
        };
        stack.push(result);
    }

    if stack.len() != 1 {
        return Err(Error::malformed_query(stack.len()));
    }
    pop_operand(&mut stack, "query")
}
