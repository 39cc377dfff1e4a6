use crate::interpreter::token::{Bracket, BracketKind, Token, TokenId, TokenKind};

/// Stable address of a token inside one [`TokenLine`].
///
/// Refs stay valid across splices of other tokens and are preserved by
/// [`TokenLine::copy`], so a ref taken from a pristine program line also
/// addresses the same token in any copy of that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    token: Token,
    prev:  Option<NodeRef>,
    next:  Option<NodeRef>,
}

/// A mutable, in-place reducible statement.
///
/// Tokens live in an arena owned by the line and are chained through
/// `prev`/`next` indices, which gives O(1) insertion, removal and replacement
/// relative to a [`NodeRef`]. Removed slots are never reused, so a ref can
/// only ever name the token it was created for.
///
/// Every method that takes a [`NodeRef`] requires the ref to be linked into
/// this line.
///
/// # Panics
/// Passing a ref that was removed, or that belongs to a different line with
/// fewer slots, panics. This is a caller bug, never a script error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenLine {
    nodes: Vec<Option<Node>>,
    head:  Option<NodeRef>,
    tail:  Option<NodeRef>,
}

impl TokenLine {
    /// Creates an empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new(),
               head:  None,
               tail:  None, }
    }

    fn node(&self, at: NodeRef) -> &Node {
        self.nodes
            .get(at.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("{at:?} is not linked into this line"))
    }

    fn node_mut(&mut self, at: NodeRef) -> &mut Node {
        self.nodes
            .get_mut(at.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{at:?} is not linked into this line"))
    }

    fn alloc(&mut self, token: Token, prev: Option<NodeRef>, next: Option<NodeRef>) -> NodeRef {
        let index = u32::try_from(self.nodes.len()).unwrap_or_else(|_| panic!("token line is full"));
        self.nodes.push(Some(Node { token, prev, next }));
        NodeRef(index)
    }

    fn unlink(&mut self, at: NodeRef) -> Node {
        let node = self.nodes[at.index()].take()
                                         .unwrap_or_else(|| panic!("{at:?} is not linked into this line"));
        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }
        node
    }

    /// Returns `true` if the line holds no tokens. O(1).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the number of tokens in the line. O(n).
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if `at` is currently linked into this line.
    #[must_use]
    pub fn contains(&self, at: NodeRef) -> bool {
        self.nodes.get(at.index()).is_some_and(Option::is_some)
    }

    /// Returns the first token of the line.
    #[must_use]
    pub const fn first(&self) -> Option<NodeRef> {
        self.head
    }

    /// Returns the last token of the line.
    #[must_use]
    pub const fn last(&self) -> Option<NodeRef> {
        self.tail
    }

    /// Returns the token following `at`.
    #[must_use]
    pub fn next(&self, at: NodeRef) -> Option<NodeRef> {
        self.node(at).next
    }

    /// Returns the token preceding `at`.
    #[must_use]
    pub fn prev(&self, at: NodeRef) -> Option<NodeRef> {
        self.node(at).prev
    }

    /// Returns the token stored at `at`.
    #[must_use]
    pub fn get(&self, at: NodeRef) -> &Token {
        &self.node(at).token
    }

    /// Returns the token stored at `at` for in-place modification.
    pub fn get_mut(&mut self, at: NodeRef) -> &mut Token {
        &mut self.node_mut(at).token
    }

    /// Appends a token at the end of the line.
    pub fn append(&mut self, token: Token) -> NodeRef {
        let at = self.alloc(token, self.tail, None);
        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(at),
            None => self.head = Some(at),
        }
        self.tail = Some(at);
        at
    }

    /// Inserts a token directly before `at`.
    pub fn insert_before(&mut self, at: NodeRef, token: Token) -> NodeRef {
        let prev = self.node(at).prev;
        let new = self.alloc(token, prev, Some(at));
        self.node_mut(at).prev = Some(new);
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(new),
            None => self.head = Some(new),
        }
        new
    }

    /// Inserts a token directly after `at`.
    pub fn insert_after(&mut self, at: NodeRef, token: Token) -> NodeRef {
        let next = self.node(at).next;
        let new = self.alloc(token, Some(at), next);
        self.node_mut(at).next = Some(new);
        match next {
            Some(next) => self.node_mut(next).prev = Some(new),
            None => self.tail = Some(new),
        }
        new
    }

    /// Inserts a token so that it ends up at position `index`.
    ///
    /// # Panics
    /// Panics if `index` is greater than the length of the line.
    pub fn insert(&mut self, index: usize, token: Token) -> NodeRef {
        match self.iter().nth(index) {
            Some((at, _)) => self.insert_before(at, token),
            None => {
                assert!(index == self.len(), "insert index {index} is out of bounds");
                self.append(token)
            },
        }
    }

    /// Unlinks `at` and returns its token.
    pub fn remove(&mut self, at: NodeRef) -> Token {
        self.unlink(at).token
    }

    /// Replaces the token at `at` in place and returns the old token. The ref
    /// keeps addressing the same position.
    pub fn replace(&mut self, at: NodeRef, token: Token) -> Token {
        std::mem::replace(&mut self.node_mut(at).token, token)
    }

    /// Drops `at` and every token after it.
    pub fn remove_from(&mut self, at: NodeRef) {
        let mut current = Some(at);
        while let Some(node) = current {
            current = self.node(node).next;
            self.unlink(node);
        }
    }

    /// Drops every token up to and including `at`.
    pub fn remove_until(&mut self, at: NodeRef) {
        while let Some(head) = self.head {
            self.unlink(head);
            if head == at {
                break;
            }
        }
    }

    /// Drops every token before `first` and after `last`, keeping the range
    /// `first..=last`.
    pub fn narrow(&mut self, first: NodeRef, last: NodeRef) {
        if let Some(before) = self.prev(first) {
            self.remove_until(before);
        }
        if let Some(after) = self.next(last) {
            self.remove_from(after);
        }
    }

    /// Removes every token.
    pub fn clear(&mut self) {
        self.nodes.iter_mut().for_each(|slot| *slot = None);
        self.head = None;
        self.tail = None;
    }

    /// Returns a view of `first..=last` that shares this line's tokens.
    #[must_use]
    pub const fn sub_list(&self, first: NodeRef, last: NodeRef) -> SubList<'_> {
        SubList { line: self,
                  first,
                  last }
    }

    /// Deep copy that keeps token ids and refs, used whenever a line has to be
    /// evaluated without disturbing the original.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Returns the token the reduction loop must act on next.
    ///
    /// A scope bracket at the start of the line always wins. Otherwise the
    /// token with the highest priority is returned, the leftmost one on ties.
    ///
    /// # Example
    /// ```
    /// use tokline::interpreter::{
    ///     line::TokenLine,
    ///     token::{Operator, Token, TokenId, TokenKind},
    ///     value::core::Value,
    /// };
    ///
    /// let mut line = TokenLine::new();
    /// line.append(Token::literal(Value::Int(2), TokenId(0), 1));
    /// line.append(Token::new(TokenKind::Operator(Operator::Add), TokenId(1), 1));
    /// line.append(Token::literal(Value::Int(3), TokenId(2), 1));
    /// let star = line.append(Token::new(TokenKind::Operator(Operator::Mul), TokenId(3), 1));
    /// line.append(Token::literal(Value::Int(4), TokenId(4), 1));
    ///
    /// assert_eq!(line.highest_priority(), Some(star));
    /// ```
    #[must_use]
    pub fn highest_priority(&self) -> Option<NodeRef> {
        let first = self.head?;
        if matches!(self.get(first).kind, TokenKind::Bracket(BracketKind::Scope, _)) {
            return Some(first);
        }

        let mut best = first;
        let mut current = self.next(first);
        while let Some(at) = current {
            if self.get(at).priority > self.get(best).priority {
                best = at;
            }
            current = self.next(at);
        }
        Some(best)
    }

    /// Returns the position of `at` counted from the start of the line.
    #[must_use]
    pub fn index_of(&self, at: NodeRef) -> Option<usize> {
        self.iter().position(|(node, _)| node == at)
    }

    /// Finds the token with the given identity.
    #[must_use]
    pub fn find_id(&self, id: TokenId) -> Option<NodeRef> {
        self.iter().find(|(_, token)| token.id == id).map(|(at, _)| at)
    }

    /// Finds the closing partner of the opening bracket at `open` by counting
    /// nested brackets of the same category.
    #[must_use]
    pub fn matching_close(&self, open: NodeRef) -> Option<NodeRef> {
        let TokenKind::Bracket(kind, Bracket::Open) = self.get(open).kind else {
            return None;
        };

        let mut depth = 0usize;
        for (at, token) in self.iter_from(open) {
            if token.is_bracket(kind, Bracket::Open) {
                depth += 1;
            } else if token.is_bracket(kind, Bracket::Close) {
                depth -= 1;
                if depth == 0 {
                    return Some(at);
                }
            }
        }
        None
    }

    /// Adds `amount` to the priority of every token strictly between `open`
    /// and `close`.
    pub fn boost_between(&mut self, open: NodeRef, close: NodeRef, amount: i32) {
        let mut current = self.next(open);
        while let Some(at) = current {
            if at == close {
                break;
            }
            self.get_mut(at).priority += amount;
            current = self.next(at);
        }
    }

    /// Iterates over all tokens from first to last.
    #[must_use]
    pub const fn iter(&self) -> Iter<'_> {
        Iter { line:    self,
               current: self.head,
               last:    None, }
    }

    /// Iterates over the tokens starting at `at`.
    #[must_use]
    pub fn iter_from(&self, at: NodeRef) -> Iter<'_> {
        debug_assert!(self.contains(at));
        Iter { line:    self,
               current: Some(at),
               last:    None, }
    }
}

impl std::fmt::Display for TokenLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (_, token)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Iterator over `(ref, token)` pairs of a line.
pub struct Iter<'a> {
    line:    &'a TokenLine,
    current: Option<NodeRef>,
    last:    Option<NodeRef>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeRef, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.current?;
        self.current = if Some(at) == self.last {
            None
        } else {
            self.line.next(at)
        };
        Some((at, self.line.get(at)))
    }
}

/// A borrowed view of a contiguous run of tokens in a line.
///
/// The view shares node identity with its line; use [`SubList::to_line`]
/// to get an independent copy.
#[derive(Clone, Copy)]
pub struct SubList<'a> {
    line:  &'a TokenLine,
    first: NodeRef,
    last:  NodeRef,
}

impl<'a> SubList<'a> {
    /// Iterates over the tokens of the view.
    #[must_use]
    pub fn iter(&self) -> Iter<'a> {
        Iter { line:    self.line,
               current: Some(self.first),
               last:    Some(self.last), }
    }

    /// Returns the number of tokens in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// A view always holds at least one token.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Copies the viewed tokens into a new line, preserving their ids.
    #[must_use]
    pub fn to_line(&self) -> TokenLine {
        let mut line = TokenLine::new();
        for (_, token) in self.iter() {
            line.append(token.clone());
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::interpreter::token::Operator;

    fn int(n: i64, id: u32) -> Token {
        Token::literal(n.into(), TokenId(id), 1)
    }

    fn op(op: Operator, id: u32) -> Token {
        Token::new(TokenKind::Operator(op), TokenId(id), 1)
    }

    fn ids(line: &TokenLine) -> Vec<u32> {
        line.iter().map(|(_, t)| t.id.0).collect()
    }

    fn assert_consistent(line: &TokenLine) {
        let forward = line.iter().map(|(at, _)| at).collect::<Vec<_>>();
        let mut backward = Vec::new();
        let mut current = line.last();
        while let Some(at) = current {
            backward.push(at);
            current = line.prev(at);
        }
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(line.first(), forward.first().copied());
        assert_eq!(line.last(), forward.last().copied());
    }

    #[test]
    fn splicing_keeps_both_directions_consistent() {
        let mut line = TokenLine::new();
        let a = line.append(int(1, 0));
        let c = line.append(int(3, 2));
        let b = line.insert_after(a, int(2, 1));
        line.insert_before(a, int(0, 3));
        line.insert(4, int(4, 4));
        assert_eq!(ids(&line), vec![3, 0, 1, 2, 4]);
        assert_consistent(&line);

        line.remove(b);
        line.remove(a);
        assert_eq!(ids(&line), vec![3, 2, 4]);
        assert_eq!(line.index_of(c), Some(1));
        assert_consistent(&line);
    }

    #[test]
    fn replace_keeps_position() {
        let mut line = TokenLine::new();
        line.append(int(1, 0));
        let plus = line.append(op(Operator::Add, 1));
        line.append(int(2, 2));

        let old = line.replace(plus, int(3, 3));
        assert_eq!(old.kind, TokenKind::Operator(Operator::Add));
        assert_eq!(ids(&line), vec![0, 3, 2]);
        assert!(line.contains(plus));
    }

    #[test]
    fn remove_from_and_until_drop_inclusive_ranges() {
        let mut line = TokenLine::new();
        let refs = (0..6).map(|i| line.append(int(i64::from(i), i))).collect::<Vec<_>>();

        line.remove_from(refs[4]);
        assert_eq!(ids(&line), vec![0, 1, 2, 3]);
        line.remove_until(refs[1]);
        assert_eq!(ids(&line), vec![2, 3]);
        assert_consistent(&line);

        line.remove_until(refs[3]);
        assert!(line.is_empty());
        assert_eq!(line.len(), 0);
    }

    #[test]
    fn copy_preserves_identity_and_refs() {
        let mut line = TokenLine::new();
        let a = line.append(int(1, 7));
        let b = line.append(int(2, 8));

        let mut copy = line.copy();
        copy.remove(a);
        assert_eq!(copy.get(b).id, TokenId(8));
        assert_eq!(line.find_id(TokenId(7)), Some(a));
        assert_eq!(copy.find_id(TokenId(7)), None);
        assert_eq!(line.len(), 2);
    }

    #[test]
    fn sub_list_views_and_copies_a_range() {
        let mut line = TokenLine::new();
        let refs = (0..5).map(|i| line.append(int(i64::from(i), i))).collect::<Vec<_>>();

        let view = line.sub_list(refs[1], refs[3]);
        assert_eq!(view.len(), 3);
        assert_eq!(ids(&view.to_line()), vec![1, 2, 3]);

        let mut narrowed = line.copy();
        narrowed.narrow(refs[1], refs[3]);
        assert_eq!(ids(&narrowed), vec![1, 2, 3]);
    }

    #[test]
    fn leading_scope_bracket_wins_over_priorities() {
        let mut line = TokenLine::new();
        let brace =
            line.append(Token::new(TokenKind::Bracket(BracketKind::Scope, Bracket::Close),
                                   TokenId(0),
                                   1));
        line.append(op(Operator::Not, 1));
        assert_eq!(line.highest_priority(), Some(brace));
    }

    #[test]
    fn ties_resolve_to_the_leftmost_token() {
        let mut line = TokenLine::new();
        line.append(int(1, 0));
        let first = line.append(op(Operator::Sub, 1));
        line.append(int(2, 2));
        line.append(op(Operator::Add, 3));
        line.append(int(3, 4));
        assert_eq!(line.highest_priority(), Some(first));
    }

    #[test]
    fn matching_close_counts_nested_brackets() {
        let paren = |half, id| {
            Token::new(TokenKind::Bracket(BracketKind::Paren, half), TokenId(id), 1)
        };
        let mut line = TokenLine::new();
        let outer = line.append(paren(Bracket::Open, 0));
        let inner = line.append(paren(Bracket::Open, 1));
        let inner_close = line.append(paren(Bracket::Close, 2));
        let outer_close = line.append(paren(Bracket::Close, 3));

        assert_eq!(line.matching_close(inner), Some(inner_close));
        assert_eq!(line.matching_close(outer), Some(outer_close));

        line.remove(outer_close);
        assert_eq!(line.matching_close(outer), None);
    }
}
