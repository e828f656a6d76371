//! Instruction list arena.

use std::ops::Index;

use hlslc_core::{CompilationError, Span};

use super::{BlockId, Node, NodeId, NodeKind};

/// Ordered instruction list owning every node it contains.
///
/// Nodes are allocated unlinked and then appended to, or inserted into, a
/// block. Block [`BlockId::ROOT`] is the function body; `if` and loop nodes
/// own further blocks. Released slots are never reused, so a stale
/// [`NodeId`] resolves to `None` through [`get`](Self::get).
#[derive(Debug, Clone)]
pub struct InstrList {
    nodes: Vec<Option<Node>>,
    blocks: Vec<Vec<NodeId>>,
}

impl Default for InstrList {
    fn default() -> Self {
        Self::new()
    }
}

impl InstrList {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            blocks: vec![Vec::new()],
        }
    }

    // ========================================================================
    // Allocation and linking
    // ========================================================================

    /// A new, empty block for the body of an `if` or a loop.
    pub fn new_block(&mut self) -> Result<BlockId, CompilationError> {
        self.blocks
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory {
                span: Span::default(),
            })?;
        self.blocks.push(Vec::new());
        Ok(BlockId(self.blocks.len() as u32 - 1))
    }

    /// Allocates an unlinked node and registers it as a user of its sources.
    pub fn create(&mut self, mut node: Node) -> Result<NodeId, CompilationError> {
        let span = node.span;
        let sources: Vec<NodeId> = node.kind.sources().collect();
        for &source in &sources {
            if self.get(source).is_none() {
                return Err(CompilationError::Internal {
                    message: format!("{} node reads released node {source}", node.kind.name()),
                    span,
                });
            }
        }

        self.nodes
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory { span })?;
        let id = NodeId(self.nodes.len() as u32);
        node.uses.clear();
        node.block = None;
        self.nodes.push(Some(node));

        for source in sources {
            if let Some(src) = self.slot_mut(source) {
                src.uses.push(id);
            }
        }
        Ok(id)
    }

    /// Links an unlinked node at the end of `block`.
    pub fn append(&mut self, block: BlockId, id: NodeId) -> Result<(), CompilationError> {
        let span = self.span_of(id);
        self.ensure_unlinked(id, span)?;
        let nodes = self
            .blocks
            .get_mut(block.index())
            .ok_or_else(|| CompilationError::Internal {
                message: format!("unknown block {}", block.0),
                span,
            })?;
        nodes
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory { span })?;
        nodes.push(id);
        if let Some(node) = self.slot_mut(id) {
            node.block = Some(block);
        }
        Ok(())
    }

    /// Allocates `node` and appends it to the root block.
    pub fn push(&mut self, node: Node) -> Result<NodeId, CompilationError> {
        let id = self.create(node)?;
        self.append(BlockId::ROOT, id)?;
        Ok(id)
    }

    /// Links an unlinked node directly after `anchor`, in the anchor's block.
    pub fn insert_after(&mut self, anchor: NodeId, id: NodeId) -> Result<(), CompilationError> {
        let span = self.span_of(id);
        self.ensure_unlinked(id, span)?;
        let (block, pos) = self.position(anchor).ok_or_else(|| CompilationError::Internal {
            message: format!("anchor {anchor} is not in the instruction list"),
            span,
        })?;
        let nodes = &mut self.blocks[block.index()];
        nodes
            .try_reserve(1)
            .map_err(|_| CompilationError::OutOfMemory { span })?;
        nodes.insert(pos + 1, id);
        if let Some(node) = self.slot_mut(id) {
            node.block = Some(block);
        }
        Ok(())
    }

    /// Removes a node from its block without releasing it.
    pub fn unlink(&mut self, id: NodeId) {
        if let Some((block, pos)) = self.position(id) {
            self.blocks[block.index()].remove(pos);
        }
        if let Some(node) = self.slot_mut(id) {
            node.block = None;
        }
    }

    /// Points every source slot of `user` that reads `old` at `new`.
    pub fn replace_source(
        &mut self,
        user: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), CompilationError> {
        let span = self.span_of(user);
        if self.get(new).is_none() {
            return Err(CompilationError::Internal {
                message: format!("cannot redirect {user} to released node {new}"),
                span,
            });
        }
        let Some(node) = self.slot_mut(user) else {
            return Err(CompilationError::Internal {
                message: format!("cannot redirect released node {user}"),
                span,
            });
        };
        let hits = redirect(&mut node.kind, old, new);

        for _ in 0..hits {
            self.remove_use(old, user);
            if let Some(src) = self.slot_mut(new) {
                src.uses.push(user);
            }
        }
        Ok(())
    }

    /// Unlinks and frees a node, detaching it from the nodes it reads.
    ///
    /// Nodes in the blocks an `if` or loop owns are freed with it, last to
    /// first. Fails without touching the list while a node outside that set
    /// still reads any of them.
    pub fn release(&mut self, id: NodeId) -> Result<(), CompilationError> {
        let span = self.span_of(id);
        if self.get(id).is_none() {
            return Err(CompilationError::Internal {
                message: format!("node {id} is already released"),
                span,
            });
        }

        let mut doomed = Vec::new();
        self.collect_owned(id, &mut doomed);
        for &node in &doomed {
            let external = self
                .get(node)
                .into_iter()
                .flat_map(Node::uses)
                .copied()
                .find(|user| !doomed.contains(user));
            if let Some(user) = external {
                tracing::warn!(node = %node, %user, "refusing to release a node that is still in use");
                return Err(CompilationError::Internal {
                    message: format!("node {node} is still read by {user}"),
                    span,
                });
            }
        }

        // Owned nodes were collected parent first; users go before what they read.
        for node in doomed.into_iter().rev() {
            self.free(node);
        }
        Ok(())
    }

    /// `id` followed by every node in the blocks it owns, depth first.
    fn collect_owned(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        let blocks = match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::If {
                then_block,
                else_block,
                ..
            }) => vec![*then_block, *else_block],
            Some(NodeKind::Loop { body }) => vec![*body],
            _ => return,
        };
        for block in blocks {
            for &child in self.block_nodes(block) {
                self.collect_owned(child, out);
            }
        }
    }

    fn free(&mut self, id: NodeId) {
        self.unlink(id);
        let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        for source in node.kind.sources() {
            self.remove_use(source, id);
        }
    }

    /// Releases every node in reverse construction order.
    pub fn clear(&mut self) {
        while self.nodes.pop().is_some() {}
        self.blocks.truncate(1);
        self.blocks[0].clear();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id)
    }

    /// Nodes of a block in order.
    pub fn block_nodes(&self, block: BlockId) -> &[NodeId] {
        self.blocks.get(block.index()).map_or(&[], Vec::as_slice)
    }

    /// Nodes of the root block in order.
    pub fn nodes(&self) -> &[NodeId] {
        self.block_nodes(BlockId::ROOT)
    }

    /// Number of nodes in the root block.
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// Number of allocated, unreleased nodes, linked or not.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes().iter().filter_map(|&id| self.get(id).map(|n| (id, n)))
    }

    /// Block and index of a linked node.
    pub fn position(&self, id: NodeId) -> Option<(BlockId, usize)> {
        let block = self.get(id)?.block?;
        let pos = self.blocks[block.index()].iter().position(|&n| n == id)?;
        Some((block, pos))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.get(id).map(|n| n.span).unwrap_or_default()
    }

    fn ensure_unlinked(&self, id: NodeId, span: Span) -> Result<(), CompilationError> {
        match self.get(id) {
            None => Err(CompilationError::Internal {
                message: format!("cannot link released node {id}"),
                span,
            }),
            Some(node) if node.block.is_some() => Err(CompilationError::Internal {
                message: format!("node {id} is already linked"),
                span,
            }),
            Some(_) => Ok(()),
        }
    }

    fn remove_use(&mut self, source: NodeId, user: NodeId) {
        if let Some(src) = self.slot_mut(source) {
            if let Some(pos) = src.uses.iter().position(|&u| u == user) {
                src.uses.remove(pos);
            }
        }
    }
}

impl Index<NodeId> for InstrList {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {id} has been released"),
        }
    }
}

/// Rewrites source slots reading `old` to read `new`; returns how many.
fn redirect(kind: &mut NodeKind, old: NodeId, new: NodeId) -> usize {
    let mut hits = 0;
    let mut swap = |slot: &mut NodeId| {
        if *slot == old {
            *slot = new;
            hits += 1;
        }
    };
    match kind {
        NodeKind::Expr { operands, .. } => operands.iter_mut().flatten().for_each(&mut swap),
        NodeKind::Load { src } => src.offset.iter_mut().for_each(&mut swap),
        NodeKind::Swizzle { val, .. } => swap(val),
        NodeKind::Assignment { lhs, rhs, .. } => {
            swap(rhs);
            lhs.offset.iter_mut().for_each(&mut swap);
        }
        NodeKind::If { condition, .. } => swap(condition),
        NodeKind::Constant { .. } | NodeKind::Loop { .. } | NodeKind::Jump { .. } => {}
    }
    hits
}
