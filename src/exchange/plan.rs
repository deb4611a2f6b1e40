//! Resolves which component feeds each declared inward, and when.

use crate::component::{Category, Component};
use crate::data::units;
use crate::store::{SlotId, SlotRegistry};
use crate::validation::error::ValidationError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// When a consumer sees a producer's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Producer runs earlier in the same step.
    SameStep,
    /// Producer runs later in the step; the consumer reads its previous-step
    /// value, which is zero before the first step.
    PreviousStep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub slot: SlotId,
    pub timing: Timing,
}

/// Slot bindings for the three components, plus the producer-to-consumer graph.
#[derive(Debug, Clone, Default)]
pub struct ExchangePlan {
    pub registry: SlotRegistry,
    inwards: [Vec<SlotId>; 3],
    outwards: [Vec<SlotId>; 3],
    graph: DiGraph<Category, Transfer>,
}

impl ExchangePlan {
    /// Components must be given in [`Category::ORDER`].
    pub fn build(components: &[Component; 3]) -> Result<Self, Vec<ValidationError>> {
        let mut plan = ExchangePlan::default();
        let mut errors = Vec::new();
        let nodes: Vec<NodeIndex> = Category::ORDER.iter().map(|&c| plan.graph.add_node(c)).collect();

        // 1. Every outward gets its own slot.
        for component in components {
            let pos = component.category().position();
            for field in component.outwards() {
                match plan.registry.register(field.name, field.units, component.category()) {
                    Ok(slot) => plan.outwards[pos].push(slot),
                    Err(e) => errors.push(ValidationError::exchange(component.category(), field.name, e.to_string())),
                }
            }
        }

        // 2. Bind inwards to the slots of their producers.
        for component in components {
            let consumer = component.category();
            for field in component.inwards() {
                let Some(slot) = plan.registry.lookup(field.name) else {
                    errors.push(ValidationError::exchange(
                        consumer,
                        field.name,
                        "no bound component produces it".into(),
                    ));
                    continue;
                };
                let producer = plan.registry.producer(slot);
                if producer == consumer {
                    errors.push(ValidationError::exchange(
                        consumer,
                        field.name,
                        "a component cannot consume its own outward".into(),
                    ));
                    continue;
                }
                let produced_units = &plan.registry.units[slot.index()];
                if !units::equivalent(produced_units, field.units) {
                    errors.push(ValidationError::exchange(
                        consumer,
                        field.name,
                        format!("produced in '{}' but consumed in '{}'", produced_units, field.units),
                    ));
                    continue;
                }
                // Same-step edges only ever point forward in the execution
                // order, so they cannot form a cycle.
                let timing = if producer.position() < consumer.position() {
                    Timing::SameStep
                } else {
                    Timing::PreviousStep
                };
                plan.graph.add_edge(nodes[producer.position()], nodes[consumer.position()], Transfer { slot, timing });
                plan.inwards[consumer.position()].push(slot);
            }
        }

        if errors.is_empty() {
            Ok(plan)
        } else {
            Err(errors)
        }
    }

    pub fn inwards(&self, category: Category) -> &[SlotId] {
        &self.inwards[category.position()]
    }

    pub fn outwards(&self, category: Category) -> &[SlotId] {
        &self.outwards[category.position()]
    }

    /// Every binding as `(producer, consumer, transfer)`.
    pub fn transfers(&self) -> impl Iterator<Item = (Category, Category, &Transfer)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()], self.graph[e.target()], e.weight()))
    }

    /// Components feeding `category`, in execution order.
    pub fn producers_of(&self, category: Category) -> Vec<Category> {
        let mut producers: Vec<Category> = self
            .graph
            .neighbors_directed(NodeIndex::new(category.position()), petgraph::Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        producers.sort();
        producers.dedup();
        producers
    }
}
