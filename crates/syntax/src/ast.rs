//! ESTree-shaped syntax tree.
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other through
//! [`NodeId`]s. Every node records its parent, its source range and its
//! named fields in ESTree visitor order, so traversal, selector attribute
//! lookup and parent walks all read from the same table.
//!
//! [`Node`] is the borrowed, `Copy` view rules and the dispatcher work with.

use estlint_types::OffsetRange;

macro_rules! node_kinds {
    ($($kind:ident),* $(,)?) => {
        /// ESTree node type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($kind,)*
        }

        impl NodeKind {
            /// Every node type, in declaration order.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind,)*];

            /// The ESTree `type` string.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(NodeKind::$kind => stringify!($kind),)*
                }
            }
        }

        impl std::str::FromStr for NodeKind {
            type Err = UnknownNodeKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($kind) => Ok(NodeKind::$kind),)*
                    _ => Err(UnknownNodeKind(s.to_string())),
                }
            }
        }
    };
}

node_kinds! {
    Program,
    EmptyStatement,
    BlockStatement,
    ExpressionStatement,
    IfStatement,
    LabeledStatement,
    BreakStatement,
    ContinueStatement,
    WithStatement,
    SwitchStatement,
    SwitchCase,
    ReturnStatement,
    ThrowStatement,
    TryStatement,
    CatchClause,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    DebuggerStatement,
    FunctionDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    ClassDeclaration,
    ClassBody,
    MethodDefinition,
    Identifier,
    Literal,
    ThisExpression,
    Super,
    ArrayExpression,
    ObjectExpression,
    Property,
    FunctionExpression,
    ArrowFunctionExpression,
    ClassExpression,
    TemplateLiteral,
    TemplateElement,
    TaggedTemplateExpression,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    LogicalExpression,
    AssignmentExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    ChainExpression,
    SequenceExpression,
    YieldExpression,
    AwaitExpression,
    MetaProperty,
    SpreadElement,
    ObjectPattern,
    ArrayPattern,
    RestElement,
    AssignmentPattern,
}

impl NodeKind {
    /// Function declarations, function expressions and arrow functions.
    #[must_use]
    pub const fn is_function(self) -> bool {
        matches!(
            self,
            Self::FunctionDeclaration | Self::FunctionExpression | Self::ArrowFunctionExpression
        )
    }

    /// Statements that `continue` can target.
    #[must_use]
    pub const fn is_loop(self) -> bool {
        matches!(
            self,
            Self::ForStatement
                | Self::ForInStatement
                | Self::ForOfStatement
                | Self::WhileStatement
                | Self::DoWhileStatement
        )
    }

    #[must_use]
    pub const fn is_class(self) -> bool {
        matches!(self, Self::ClassDeclaration | Self::ClassExpression)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeKind(pub String);

impl std::fmt::Display for UnknownNodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown node type '{}'", self.0)
    }
}

impl std::error::Error for UnknownNodeKind {}

/// Index of a node in its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Value of a named node field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Single child slot, `None` when the slot is empty (e.g. `init` of `var a;`)
    Node(Option<NodeId>),
    /// Child list; `None` entries are array holes such as `[a, , b]`
    Nodes(Vec<Option<NodeId>>),
    Str(String),
    Bool(bool),
    Num(f64),
    Null,
}

/// Arena storage for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub range: OffsetRange,
    pub parent: Option<NodeId>,
    pub fields: Vec<(&'static str, FieldValue)>,
}

/// A parsed program.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Ast {
    /// Build a tree from arena nodes, filling in parent links.
    ///
    /// Children must be referenced by exactly one field of one parent.
    #[must_use]
    pub fn new(mut nodes: Vec<NodeData>, root: NodeId) -> Self {
        let mut links = Vec::new();
        for (index, data) in nodes.iter().enumerate() {
            let parent = NodeId(index as u32);
            for (_, value) in &data.fields {
                match value {
                    FieldValue::Node(Some(child)) => links.push((*child, parent)),
                    FieldValue::Nodes(children) => {
                        links.extend(children.iter().flatten().map(|child| (*child, parent)));
                    }
                    _ => {}
                }
            }
        }
        for (child, parent) in links {
            nodes[child.index()].parent = Some(parent);
        }
        Self { nodes, root }
    }

    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { ast: self, id }
    }

    #[must_use]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indented outline of the tree, one node per line.
    #[must_use]
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        write_tree(&mut out, self.root(), None, 0);
        out
    }
}

fn write_tree(out: &mut String, node: Node<'_>, label: Option<&str>, depth: usize) {
    use std::fmt::Write;

    let indent = "  ".repeat(depth);
    let label = label.map(|l| format!("{l}: ")).unwrap_or_default();
    let _ = write!(out, "{indent}{label}{}@{}", node.kind(), node.range());
    for (name, value) in node.fields() {
        match value {
            FieldValue::Str(s) => {
                let _ = write!(out, " {name}={s:?}");
            }
            FieldValue::Bool(true) => {
                let _ = write!(out, " {name}");
            }
            FieldValue::Num(n) => {
                let _ = write!(out, " {name}={n}");
            }
            FieldValue::Null => {
                let _ = write!(out, " {name}=null");
            }
            _ => {}
        }
    }
    out.push('\n');
    for (name, value) in node.fields() {
        match value {
            FieldValue::Node(Some(child)) => {
                write_tree(out, node.ast.node(*child), Some(name), depth + 1);
            }
            FieldValue::Nodes(children) => {
                for child in children {
                    match child {
                        Some(child) => write_tree(out, node.ast.node(*child), Some(name), depth + 1),
                        None => {
                            let _ = writeln!(out, "{indent}  {name}: <hole>");
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Borrowed handle to one node of an [`Ast`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl<'a> Node<'a> {
    #[must_use]
    pub const fn id(self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn ast(self) -> &'a Ast {
        self.ast
    }

    fn data(self) -> &'a NodeData {
        &self.ast.nodes[self.id.index()]
    }

    #[must_use]
    pub fn kind(self) -> NodeKind {
        self.data().kind
    }

    #[must_use]
    pub fn is(self, kind: NodeKind) -> bool {
        self.kind() == kind
    }

    #[must_use]
    pub fn range(self) -> OffsetRange {
        self.data().range
    }

    #[must_use]
    pub fn parent(self) -> Option<Node<'a>> {
        self.data().parent.map(|id| self.ast.node(id))
    }

    /// Parent, grandparent and so on up to the program.
    pub fn ancestors(self) -> impl Iterator<Item = Node<'a>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    #[must_use]
    pub fn fields(self) -> &'a [(&'static str, FieldValue)] {
        &self.data().fields
    }

    #[must_use]
    pub fn field(self, name: &str) -> Option<&'a FieldValue> {
        self.fields()
            .iter()
            .find_map(|(n, value)| (*n == name).then_some(value))
    }

    /// The node in a single-child field.
    #[must_use]
    pub fn child(self, name: &str) -> Option<Node<'a>> {
        match self.field(name)? {
            FieldValue::Node(Some(id)) => Some(self.ast.node(*id)),
            _ => None,
        }
    }

    /// The nodes of a list field, skipping holes.
    #[must_use]
    pub fn children(self, name: &str) -> Vec<Node<'a>> {
        match self.field(name) {
            Some(FieldValue::Nodes(ids)) => ids.iter().flatten().map(|id| self.ast.node(*id)).collect(),
            _ => Vec::new(),
        }
    }

    /// The entries of a list field, holes included.
    #[must_use]
    pub fn elements(self, name: &str) -> Vec<Option<Node<'a>>> {
        match self.field(name) {
            Some(FieldValue::Nodes(ids)) => ids
                .iter()
                .map(|id| id.map(|id| self.ast.node(id)))
                .collect(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn str(self, name: &str) -> Option<&'a str> {
        match self.field(name)? {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// A boolean field, `false` when absent.
    #[must_use]
    pub fn flag(self, name: &str) -> bool {
        matches!(self.field(name), Some(FieldValue::Bool(true)))
    }

    #[must_use]
    pub fn num(self, name: &str) -> Option<f64> {
        match self.field(name)? {
            FieldValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// The `name` of an `Identifier`.
    #[must_use]
    pub fn name(self) -> Option<&'a str> {
        if self.is(NodeKind::Identifier) {
            self.str("name")
        } else {
            None
        }
    }

    /// Direct children in field order.
    #[must_use]
    pub fn child_nodes(self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        for (_, value) in self.fields() {
            match value {
                FieldValue::Node(Some(id)) => out.push(self.ast.node(*id)),
                FieldValue::Nodes(ids) => out.extend(ids.iter().flatten().map(|id| self.ast.node(*id))),
                _ => {}
            }
        }
        out
    }

    /// Name of the parent field holding this node.
    #[must_use]
    pub fn field_name_in_parent(self) -> Option<&'static str> {
        let parent = self.parent()?;
        parent.fields().iter().find_map(|(name, value)| {
            let holds = match value {
                FieldValue::Node(Some(id)) => *id == self.id,
                FieldValue::Nodes(ids) => ids.contains(&Some(self.id)),
                _ => false,
            };
            holds.then_some(*name)
        })
    }

    /// Visit this node and its descendants in preorder. Returning `false`
    /// from `f` skips the children of the visited node.
    pub fn walk(self, mut f: impl FnMut(Node<'a>) -> bool) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if f(node) {
                let children = node.child_nodes();
                stack.extend(children.into_iter().rev());
            }
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.ast, other.ast) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.kind(), self.range())
    }
}

/// Incremental arena builder used by the parser.
#[derive(Debug, Default)]
pub(crate) struct AstBuilder {
    nodes: Vec<NodeData>,
}

impl AstBuilder {
    pub(crate) fn push(
        &mut self,
        kind: NodeKind,
        range: OffsetRange,
        fields: Vec<(&'static str, FieldValue)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            range,
            parent: None,
            fields,
        });
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn finish(self, root: NodeId) -> Ast {
        Ast::new(self.nodes, root)
    }
}
