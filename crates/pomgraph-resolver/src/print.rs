//! Human-readable renderings of a package list: tree, flat list, and
//! summary statistics.

use std::io::{self, Write};
use std::str::FromStr;

use petgraph::graph::NodeIndex;

use pomgraph_core::package::{Package, Relationship};

use crate::graph::{GraphNode, PackageGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Tree,
    List,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree" => Ok(Format::Tree),
            "list" => Ok(Format::List),
            other => Err(format!("unknown format `{other}` (expected `tree` or `list`)")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    pub show_all: bool,
    /// Deepest level rendered below the roots; 0 renders everything.
    pub max_depth: usize,
    pub show_relationships: bool,
    pub format: Format,
}

/// Render `packages` in the format selected by `opts`.
pub fn render<W: Write>(
    out: &mut W,
    packages: &[Package],
    target: &str,
    opts: &PrintOptions,
) -> io::Result<()> {
    match opts.format {
        Format::Tree => render_tree(out, packages, target, opts),
        Format::List => render_list(out, packages, target, opts),
    }
}

fn no_packages<W: Write>(out: &mut W, target: &str) -> io::Result<()> {
    writeln!(out, "No packages found for {target}")
}

fn label(pkg: &Package, opts: &PrintOptions) -> String {
    let mut label = if pkg.version.is_empty() {
        pkg.name.clone()
    } else {
        format!("{}@{}", pkg.name, pkg.version)
    };
    if opts.show_relationships && pkg.relationship != Relationship::Unknown {
        label.push_str(&format!(" [{}]", pkg.relationship));
    }
    if pkg.dev {
        label.push_str(" [dev]");
    }
    label
}

/// Packages on the path from the current root down to the node being
/// expanded, innermost first.
struct Ancestors<'a> {
    id: &'a str,
    parent: Option<&'a Ancestors<'a>>,
}

impl Ancestors<'_> {
    fn contains(&self, id: &str) -> bool {
        let mut cursor = Some(self);
        while let Some(node) = cursor {
            if node.id == id {
                return true;
            }
            cursor = node.parent;
        }
        false
    }
}

struct TreeWriter<'g, 'a> {
    graph: &'g PackageGraph<'a>,
    opts: &'g PrintOptions,
}

impl TreeWriter<'_, '_> {
    fn write_children<W: Write>(
        &self,
        out: &mut W,
        idx: NodeIndex,
        prefix: &str,
        depth: usize,
        path: &Ancestors<'_>,
    ) -> io::Result<()> {
        if self.opts.max_depth > 0 && depth >= self.opts.max_depth {
            return Ok(());
        }

        let children = self.graph.children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { "└── " } else { "├── " };
            match self.graph.node(child) {
                GraphNode::Missing(id) => {
                    writeln!(out, "{prefix}{connector}{id} (not found)")?;
                }
                GraphNode::Package(pkg) if path.contains(&pkg.id) => {
                    writeln!(
                        out,
                        "{prefix}{connector}{} (circular dependency)",
                        label(pkg, self.opts)
                    )?;
                }
                GraphNode::Package(pkg) => {
                    writeln!(out, "{prefix}{connector}{}", label(pkg, self.opts))?;
                    let below = Ancestors {
                        id: &pkg.id,
                        parent: Some(path),
                    };
                    let child_prefix =
                        format!("{prefix}{}", if is_last { "    " } else { "│   " });
                    self.write_children(out, child, &child_prefix, depth + 1, &below)?;
                }
            }
        }
        Ok(())
    }
}

/// Depth-first tree of every root package.
///
/// A package may appear under several branches. It is only cut short when
/// it already sits on the path above it.
pub fn render_tree<W: Write>(
    out: &mut W,
    packages: &[Package],
    target: &str,
    opts: &PrintOptions,
) -> io::Result<()> {
    if packages.is_empty() {
        return no_packages(out, target);
    }

    let graph = PackageGraph::from_packages(packages);
    let roots = graph.root_packages(opts.show_all);
    if roots.is_empty() {
        return writeln!(out, "No root packages found for {target}");
    }

    writeln!(out, "Dependency Tree")?;
    writeln!(out, "===============")?;
    writeln!(out, "{target}")?;

    let writer = TreeWriter {
        graph: &graph,
        opts,
    };
    for root in roots {
        let GraphNode::Package(pkg) = graph.node(root) else {
            continue;
        };
        writeln!(out)?;
        writeln!(out, "{}", label(pkg, opts))?;
        let path = Ancestors {
            id: &pkg.id,
            parent: None,
        };
        writer.write_children(out, root, "", 1, &path)?;
    }
    Ok(())
}

/// Packages grouped by relationship, sorted by name within each group.
pub fn render_list<W: Write>(
    out: &mut W,
    packages: &[Package],
    target: &str,
    opts: &PrintOptions,
) -> io::Result<()> {
    if packages.is_empty() {
        return no_packages(out, target);
    }

    writeln!(out, "Dependency List for {target}")?;
    writeln!(out, "======================")?;

    for rel in Relationship::DISPLAY_ORDER {
        let mut group: Vec<&Package> = packages
            .iter()
            .filter(|p| p.relationship == rel)
            .collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));

        writeln!(out)?;
        writeln!(out, "{} Dependencies ({}):", rel.title(), group.len())?;
        for pkg in group {
            let deps = pkg.depends_on.len();
            if deps > 0 {
                writeln!(
                    out,
                    "  - {} (depends on {deps} packages)",
                    label(pkg, opts)
                )?;
            } else {
                writeln!(out, "  - {}", label(pkg, opts))?;
            }
        }
    }
    Ok(())
}

/// Totals over a package list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statistics {
    pub total_packages: usize,
    /// Sum of `depends_on` lengths. A shared dependency counts once per
    /// dependent.
    pub total_dependencies: usize,
    pub dev_dependencies: usize,
    /// Non-zero counts in display order.
    pub by_relationship: Vec<(Relationship, usize)>,
}

impl Statistics {
    pub fn collect(packages: &[Package]) -> Self {
        let by_relationship = Relationship::DISPLAY_ORDER
            .iter()
            .map(|&rel| {
                let n = packages.iter().filter(|p| p.relationship == rel).count();
                (rel, n)
            })
            .filter(|&(_, n)| n > 0)
            .collect();
        Self {
            total_packages: packages.len(),
            total_dependencies: packages.iter().map(|p| p.depends_on.len()).sum(),
            dev_dependencies: packages.iter().filter(|p| p.dev).count(),
            by_relationship,
        }
    }
}

pub fn render_stats<W: Write>(out: &mut W, packages: &[Package], target: &str) -> io::Result<()> {
    if packages.is_empty() {
        return no_packages(out, target);
    }

    let stats = Statistics::collect(packages);
    writeln!(out, "Dependency Statistics for {target}")?;
    writeln!(out, "=============================")?;
    writeln!(out)?;
    writeln!(out, "Total Packages: {}", stats.total_packages)?;
    writeln!(out, "Total Dependencies: {}", stats.total_dependencies)?;
    writeln!(out, "Development Dependencies: {}", stats.dev_dependencies)?;
    writeln!(out)?;
    writeln!(out, "By Relationship:")?;
    for (rel, n) in stats.by_relationship {
        writeln!(out, "  {}: {n}", rel.title())?;
    }
    writeln!(out)
}
