//! Simple selector → node predicate
//!
//! A compiled predicate is an AND-chain of independent checks. Retrieval
//! strategies pass a [`Skip`] set for the conditions their lookup already
//! guarantees, so those checks are left out of the chain.

use smallvec::SmallVec;

use crate::config::PseudoPolicy;
use crate::error::{Result, SelectorError};
use crate::nth::NthChild;
use crate::parser::{self, AttrOp, AttrSelector, PseudoSpec, SelectorPart};
use crate::tree::{element_index, next_element, previous_element, CaseMode, NodeTree};

/// The tree being matched against and its case rules for this call
pub struct MatchContext<'t, T: NodeTree> {
    pub tree: &'t T,
    pub case: CaseMode,
}

impl<T: NodeTree> Clone for MatchContext<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: NodeTree> Copy for MatchContext<'_, T> {}

impl<'t, T: NodeTree> MatchContext<'t, T> {
    /// Case rules are read from `root` on every call, never cached
    pub fn new(tree: &'t T, root: T::Node) -> Self {
        Self {
            tree,
            case: tree.case_mode(root),
        }
    }
}

/// Checks a caller already guarantees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Skip {
    pub element: bool,
    pub tag: bool,
    pub id: bool,
    pub classes: bool,
}

impl Skip {
    pub const NONE: Self = Self {
        element: false,
        tag: false,
        id: false,
        classes: false,
    };

    pub const fn element(mut self) -> Self {
        self.element = true;
        self
    }

    pub const fn tag(mut self) -> Self {
        self.tag = true;
        self
    }

    pub const fn id(mut self) -> Self {
        self.id = true;
        self
    }

    pub const fn classes(mut self) -> Self {
        self.classes = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PseudoCheck {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
    Checked,
    Contains(String),
    Not(Box<Predicate>),
    NthChild(NthChild),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Element,
    Tag(String),
    Class(String),
    Pseudo(PseudoCheck),
    Attr(AttrSelector),
    Id(String),
}

/// Compiled node test
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Deliberately matches every node; nothing was left to check
    MatchAll,
    Checks(SmallVec<[Check; 4]>),
}

impl Predicate {
    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }

    pub fn matches<T: NodeTree>(&self, ctx: MatchContext<'_, T>, node: T::Node) -> bool {
        match self {
            Predicate::MatchAll => true,
            Predicate::Checks(checks) => checks.iter().all(|check| check.matches(ctx, node)),
        }
    }
}

/// Compile `part` into a predicate, leaving out everything in `skip`
pub fn compile(part: &SelectorPart, skip: Skip, policy: PseudoPolicy) -> Result<Predicate> {
    let mut checks: SmallVec<[Check; 4]> = SmallVec::new();

    if !skip.element {
        checks.push(Check::Element);
    }
    if !skip.tag && !part.is_universal() {
        checks.push(Check::Tag(part.tag.clone()));
    }
    if !skip.classes {
        checks.extend(part.classes.iter().cloned().map(Check::Class));
    }
    for pseudo in &part.pseudos {
        if let Some(check) = compile_pseudo(pseudo, policy)? {
            checks.push(Check::Pseudo(check));
        }
    }
    checks.extend(part.attrs.iter().cloned().map(Check::Attr));
    if !skip.id {
        if let Some(id) = &part.id {
            checks.push(Check::Id(id.clone()));
        }
    }

    if checks.is_empty() {
        Ok(Predicate::MatchAll)
    } else {
        Ok(Predicate::Checks(checks))
    }
}

/// `None` means the pseudo-class imposes nothing
fn compile_pseudo(pseudo: &PseudoSpec, policy: PseudoPolicy) -> Result<Option<PseudoCheck>> {
    let argument = || {
        pseudo
            .arg
            .as_deref()
            .filter(|arg| !arg.is_empty())
            .ok_or_else(|| SelectorError::MissingArgument(pseudo.name.clone()))
    };

    let check = match pseudo.name.as_str() {
        "first-child" => PseudoCheck::FirstChild,
        "last-child" => PseudoCheck::LastChild,
        "only-child" => PseudoCheck::OnlyChild,
        "empty" => PseudoCheck::Empty,
        "checked" => PseudoCheck::Checked,
        "contains" => PseudoCheck::Contains(parser::unquote(argument()?)),
        "nth-child" => PseudoCheck::NthChild(NthChild::parse(argument()?)?),
        "not" => {
            let inner = parser::parse(argument()?)?;
            let first = inner
                .first()
                .ok_or_else(|| SelectorError::MissingArgument(pseudo.name.clone()))?;
            let negated = compile(first, Skip::NONE.element(), policy)?;
            PseudoCheck::Not(Box::new(negated))
        }
        other => match policy {
            PseudoPolicy::Permissive => {
                tracing::debug!("[Predicate] Unknown pseudo-class :{} matches everything", other);
                return Ok(None);
            }
            PseudoPolicy::Strict => {
                return Err(SelectorError::UnknownPseudoClass(other.to_string()));
            }
        },
    };
    Ok(Some(check))
}

impl Check {
    fn matches<T: NodeTree>(&self, ctx: MatchContext<'_, T>, node: T::Node) -> bool {
        let tree = ctx.tree;
        match self {
            Check::Element => tree.is_element(node),
            Check::Tag(tag) => tree
                .tag_name(node)
                .is_some_and(|name| ctx.case.tag_eq(name, tag)),
            Check::Class(class) => tree
                .class_name(node)
                .is_some_and(|attr| ctx.case.has_class(attr, class)),
            Check::Pseudo(pseudo) => pseudo.matches(ctx, node),
            Check::Attr(attr) => attr_matches(tree.attribute(node, &attr.name), attr),
            Check::Id(id) => tree
                .attribute(node, "id")
                .is_some_and(|value| ctx.case.name_eq(value, id)),
        }
    }
}

impl PseudoCheck {
    fn matches<T: NodeTree>(&self, ctx: MatchContext<'_, T>, node: T::Node) -> bool {
        let tree = ctx.tree;
        match self {
            PseudoCheck::FirstChild => previous_element(tree, node).is_none(),
            PseudoCheck::LastChild => next_element(tree, node).is_none(),
            PseudoCheck::OnlyChild => {
                previous_element(tree, node).is_none() && next_element(tree, node).is_none()
            }
            PseudoCheck::Empty => tree
                .children(node)
                .all(|child| !tree.is_element(child) && tree.text(child).is_none()),
            PseudoCheck::Checked => {
                tree.attribute(node, "checked").is_some() || tree.attribute(node, "selected").is_some()
            }
            PseudoCheck::Contains(text) => tree.text_content(node).contains(text.as_str()),
            PseudoCheck::Not(inner) => !inner.matches(ctx, node),
            PseudoCheck::NthChild(nth) => nth.matches(element_index(tree, node)),
        }
    }
}

fn attr_matches(actual: Option<&str>, attr: &AttrSelector) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    let wanted = attr.value.as_str();
    match attr.op {
        AttrOp::Exists => true,
        AttrOp::Equals => actual == wanted,
        AttrOp::Prefix => !wanted.is_empty() && actual.starts_with(wanted),
        AttrOp::Suffix => !wanted.is_empty() && actual.ends_with(wanted),
        AttrOp::Substring => !wanted.is_empty() && actual.contains(wanted),
        AttrOp::Includes => {
            !wanted.is_empty()
                && !wanted.contains(char::is_whitespace)
                && actual.split_ascii_whitespace().any(|word| word == wanted)
        }
        AttrOp::DashMatch => {
            actual == wanted
                || actual
                    .strip_prefix(wanted)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
    }
}
