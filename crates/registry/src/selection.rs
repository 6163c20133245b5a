//! Unions and intersections of hierarchies and families.
//!
//! `a | b` validates against every variant in either operand; `a & b` only
//! against variants in both. Operands may come from different hierarchies with
//! different discriminator fields, as long as they share the base `B`.

use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};

use crate::handle::{Family, Hierarchy};
use crate::hierarchy::{FamilyId, HierarchyId, Target};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node {
	Target(Target),
	Any(Vec<Node>),
	All(Vec<Node>),
}

/// What a validation resolves against.
pub struct Selection<B: ?Sized> {
	node: Node,
	_base: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized> Clone for Selection<B> {
	fn clone(&self) -> Self {
		Self::from_node(self.node.clone())
	}
}

impl<B: ?Sized> std::fmt::Debug for Selection<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.node.fmt(f)
	}
}

impl<B: ?Sized> Selection<B> {
	fn from_node(node: Node) -> Self {
		Self {
			node,
			_base: PhantomData,
		}
	}

	pub fn target(target: impl Into<Target>) -> Self {
		Self::from_node(Node::Target(target.into()))
	}

	pub(crate) fn node(&self) -> &Node {
		&self.node
	}

	/// Variants in either selection.
	pub fn union(self, other: impl Into<Selection<B>>) -> Self {
		let other = other.into().node;
		let node = match (self.node, other) {
			(Node::Any(mut a), Node::Any(b)) => {
				a.extend(b);
				Node::Any(a)
			}
			(Node::Any(mut a), b) => {
				a.push(b);
				Node::Any(a)
			}
			(a, b) => Node::Any(vec![a, b]),
		};
		Self::from_node(node)
	}

	/// Variants in both selections.
	pub fn intersection(self, other: impl Into<Selection<B>>) -> Self {
		let other = other.into().node;
		let node = match (self.node, other) {
			(Node::All(mut a), Node::All(b)) => {
				a.extend(b);
				Node::All(a)
			}
			(Node::All(mut a), b) => {
				a.push(b);
				Node::All(a)
			}
			(a, b) => Node::All(vec![a, b]),
		};
		Self::from_node(node)
	}
}

impl<B: ?Sized> From<Target> for Selection<B> {
	fn from(target: Target) -> Self {
		Self::target(target)
	}
}

impl<B: ?Sized> From<HierarchyId> for Selection<B> {
	fn from(id: HierarchyId) -> Self {
		Self::target(id)
	}
}

impl<B: ?Sized> From<FamilyId> for Selection<B> {
	fn from(id: FamilyId) -> Self {
		Self::target(id)
	}
}

impl<B: ?Sized + 'static> From<&Hierarchy<B>> for Selection<B> {
	fn from(hierarchy: &Hierarchy<B>) -> Self {
		hierarchy.selection()
	}
}

impl<B: ?Sized + 'static> From<&Family<B>> for Selection<B> {
	fn from(family: &Family<B>) -> Self {
		family.selection()
	}
}

impl<B: ?Sized, R: Into<Selection<B>>> BitOr<R> for Selection<B> {
	type Output = Selection<B>;

	fn bitor(self, rhs: R) -> Selection<B> {
		self.union(rhs)
	}
}

impl<B: ?Sized, R: Into<Selection<B>>> BitAnd<R> for Selection<B> {
	type Output = Selection<B>;

	fn bitand(self, rhs: R) -> Selection<B> {
		self.intersection(rhs)
	}
}

impl<B: ?Sized + 'static, R: Into<Selection<B>>> BitOr<R> for &Hierarchy<B> {
	type Output = Selection<B>;

	fn bitor(self, rhs: R) -> Selection<B> {
		self.selection().union(rhs)
	}
}

impl<B: ?Sized + 'static, R: Into<Selection<B>>> BitAnd<R> for &Hierarchy<B> {
	type Output = Selection<B>;

	fn bitand(self, rhs: R) -> Selection<B> {
		self.selection().intersection(rhs)
	}
}

impl<B: ?Sized + 'static, R: Into<Selection<B>>> BitOr<R> for &Family<B> {
	type Output = Selection<B>;

	fn bitor(self, rhs: R) -> Selection<B> {
		self.selection().union(rhs)
	}
}

impl<B: ?Sized + 'static, R: Into<Selection<B>>> BitAnd<R> for &Family<B> {
	type Output = Selection<B>;

	fn bitand(self, rhs: R) -> Selection<B> {
		self.selection().intersection(rhs)
	}
}
