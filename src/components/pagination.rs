use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageNode {
    Page(usize),
    Ellipsis,
}

/// Render-ready pagination controls: a Prev/Next pair with enablement and
/// jump targets, plus the windowed page-number nodes between them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaginationPlan {
    pub nodes: Vec<PageNode>,
    pub current: usize,
    pub total: usize,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub prev_target: usize,
    pub next_target: usize,
}

impl PaginationPlan {
    pub fn resolve(total: usize, current: usize) -> Self {
        Self::resolve_with(total, current, 1, 1)
    }

    pub fn resolve_with(total: usize, current: usize, siblings: usize, boundaries: usize) -> Self {
        let total = total.max(1);
        let current = current.clamp(1, total);
        Self {
            nodes: nodes(total, current, siblings.min(4), boundaries.min(4)),
            current,
            total,
            prev_enabled: current > 1,
            next_enabled: current < total,
            prev_target: current.saturating_sub(1).max(1),
            next_target: (current + 1).min(total),
        }
    }

    /// Plan for a zero-row result: no page buttons, both arrows disabled.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            current: 1,
            total: 0,
            prev_enabled: false,
            next_enabled: false,
            prev_target: 1,
            next_target: 1,
        }
    }

    pub fn page_numbers(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                PageNode::Page(page) => Some(*page),
                PageNode::Ellipsis => None,
            })
            .collect()
    }
}

fn nodes(total: usize, current: usize, siblings: usize, boundaries: usize) -> Vec<PageNode> {
    if total <= 7 {
        return (1..=total).map(PageNode::Page).collect();
    }

    let mut pages = BTreeSet::new();
    let boundaries = boundaries.max(1);

    for page in 1..=boundaries.min(total) {
        pages.insert(page);
    }

    let start_tail = total.saturating_sub(boundaries).saturating_add(1);
    for page in start_tail..=total {
        pages.insert(page);
    }

    let start_middle = current.saturating_sub(siblings).max(1);
    let end_middle = (current + siblings).min(total);
    for page in start_middle..=end_middle {
        pages.insert(page);
    }

    let mut nodes = Vec::new();
    let mut previous: Option<usize> = None;
    for page in pages {
        if let Some(prev) = previous {
            if page > prev + 1 {
                nodes.push(PageNode::Ellipsis);
            }
        }
        nodes.push(PageNode::Page(page));
        previous = Some(page);
    }
    nodes
}
