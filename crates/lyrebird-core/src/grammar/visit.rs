//! Visitor over grammar productions.
//!
//! Overriding `visit_production` and delegating to `walk_production`
//! gives a pre-order traversal that also descends into alternation
//! branches.

use super::{Production, Rule};

pub trait Visitor {
    fn visit_rule(&mut self, rule: &Rule) {
        walk_rule(self, rule);
    }

    fn visit_production(&mut self, prod: &Production) {
        walk_production(self, prod);
    }
}

pub fn walk_rule<V: Visitor + ?Sized>(visitor: &mut V, rule: &Rule) {
    for prod in &rule.definition {
        visitor.visit_production(prod);
    }
}

pub fn walk_production<V: Visitor + ?Sized>(visitor: &mut V, prod: &Production) {
    if let Production::Alternation { alternatives, .. } = prod {
        for alt in alternatives {
            for child in alt {
                visitor.visit_production(child);
            }
        }
        return;
    }
    for child in prod.children() {
        visitor.visit_production(child);
    }
}
