use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scl_types::{ChoiceName, Location, NodeId, PartySet, TemplateId};

use crate::node::{CreateNode, ExerciseNode, FetchNode, LookupByKeyNode};

// ---------------------------------------------------------------------------
// AuthorizationMode
// ---------------------------------------------------------------------------

/// Whether and against whom a traversal checks authorization.
///
/// Under [`AuthorizationMode::Authorize`] the authorizer set evolves along
/// the traversal path: entering an exercise replaces it with the exercise's
/// signatories joined with its acting parties. `DontAuthorize` propagates
/// unchanged and records nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationMode {
    DontAuthorize,
    Authorize { authorizers: PartySet },
}

impl AuthorizationMode {
    pub fn authorize(authorizers: PartySet) -> Self {
        Self::Authorize { authorizers }
    }

    /// The witness set a traversal starts from: the authorizers when
    /// checking, empty otherwise.
    pub fn initial_witnesses(&self) -> PartySet {
        match self {
            Self::DontAuthorize => PartySet::new(),
            Self::Authorize { authorizers } => authorizers.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// FailedAuthorization
// ---------------------------------------------------------------------------

/// A single authorization failure with the literal diagnostic sets: the
/// authorizers in force at the moment of failure and the set the check
/// required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailedAuthorization {
    CreateMissingAuthorization {
        template_id: TemplateId,
        location: Option<Location>,
        authorizing_parties: PartySet,
        required_parties: PartySet,
    },
    NoSignatories {
        template_id: TemplateId,
        location: Option<Location>,
    },
    MaintainersNotSubsetOfSignatories {
        template_id: TemplateId,
        location: Option<Location>,
        maintainers: PartySet,
        signatories: PartySet,
    },
    NoControllers {
        template_id: TemplateId,
        choice: ChoiceName,
        location: Option<Location>,
    },
    ActorMismatch {
        template_id: TemplateId,
        choice: ChoiceName,
        location: Option<Location>,
        given_actors: PartySet,
    },
    ExerciseMissingAuthorization {
        template_id: TemplateId,
        choice: ChoiceName,
        location: Option<Location>,
        authorizing_parties: PartySet,
        required_parties: PartySet,
    },
    FetchMissingAuthorization {
        template_id: TemplateId,
        location: Option<Location>,
        authorizing_parties: PartySet,
        stakeholders: PartySet,
    },
    LookupByKeyMissingAuthorization {
        template_id: TemplateId,
        location: Option<Location>,
        authorizing_parties: PartySet,
        maintainers: PartySet,
    },
}

/// Per-node authorization failures, first-wins: once a node has a recorded
/// failure, later attempts leave it intact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAuthorizations(BTreeMap<NodeId, FailedAuthorization>);

impl FailedAuthorizations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, node_id: NodeId) -> Option<&FailedAuthorization> {
        self.0.get(&node_id)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, NodeId, FailedAuthorization> {
        self.0.iter()
    }

    /// Record a failure for `node_id` unless one is already present.
    pub fn note(&mut self, node_id: NodeId, failure: FailedAuthorization) {
        self.0.entry(node_id).or_insert(failure);
    }
}

// ---------------------------------------------------------------------------
// Per-node-kind checks
// ---------------------------------------------------------------------------

/// Create: signatories must all authorize, must be non-empty, and key
/// maintainers must be drawn from the signatories.
pub(crate) fn check_create(
    authorizers: &PartySet,
    node_id: NodeId,
    create: &CreateNode,
    failed: &mut FailedAuthorizations,
) {
    if !create.signatories.is_subset(authorizers) {
        failed.note(
            node_id,
            FailedAuthorization::CreateMissingAuthorization {
                template_id: create.template_id.clone(),
                location: create.location.clone(),
                authorizing_parties: authorizers.clone(),
                required_parties: create.signatories.clone(),
            },
        );
    }
    if create.signatories.is_empty() {
        failed.note(
            node_id,
            FailedAuthorization::NoSignatories {
                template_id: create.template_id.clone(),
                location: create.location.clone(),
            },
        );
    }
    if let Some(key) = &create.key {
        if !key.maintainers.is_subset(&create.signatories) {
            failed.note(
                node_id,
                FailedAuthorization::MaintainersNotSubsetOfSignatories {
                    template_id: create.template_id.clone(),
                    location: create.location.clone(),
                    maintainers: key.maintainers.clone(),
                    signatories: create.signatories.clone(),
                },
            );
        }
    }
}

/// Exercise: controllers must exist, must equal the actors, and must all
/// authorize.
pub(crate) fn check_exercise<Nid>(
    authorizers: &PartySet,
    node_id: NodeId,
    exercise: &ExerciseNode<Nid>,
    failed: &mut FailedAuthorizations,
) {
    if exercise.acting_parties.is_empty() {
        failed.note(
            node_id,
            FailedAuthorization::NoControllers {
                template_id: exercise.template_id.clone(),
                choice: exercise.choice.clone(),
                location: exercise.location.clone(),
            },
        );
    }
    if exercise.controllers_differ_from_actors {
        failed.note(
            node_id,
            FailedAuthorization::ActorMismatch {
                template_id: exercise.template_id.clone(),
                choice: exercise.choice.clone(),
                location: exercise.location.clone(),
                given_actors: exercise.acting_parties.clone(),
            },
        );
    }
    if !exercise.acting_parties.is_subset(authorizers) {
        failed.note(
            node_id,
            FailedAuthorization::ExerciseMissingAuthorization {
                template_id: exercise.template_id.clone(),
                choice: exercise.choice.clone(),
                location: exercise.location.clone(),
                authorizing_parties: authorizers.clone(),
                required_parties: exercise.acting_parties.clone(),
            },
        );
    }
}

/// Fetch: some stakeholder must authorize. A positive read only proves
/// existence to parties already entitled to know of it.
pub(crate) fn check_fetch(
    authorizers: &PartySet,
    node_id: NodeId,
    fetch: &FetchNode,
    failed: &mut FailedAuthorizations,
) {
    if fetch.stakeholders.is_disjoint(authorizers) {
        failed.note(
            node_id,
            FailedAuthorization::FetchMissingAuthorization {
                template_id: fetch.template_id.clone(),
                location: fetch.location.clone(),
                authorizing_parties: authorizers.clone(),
                stakeholders: fetch.stakeholders.clone(),
            },
        );
    }
}

/// LookupByKey: every maintainer must authorize. Stricter than fetch
/// because a negative lookup leaks non-existence.
pub(crate) fn check_lookup_by_key(
    authorizers: &PartySet,
    node_id: NodeId,
    lookup: &LookupByKeyNode,
    failed: &mut FailedAuthorizations,
) {
    if !lookup.key.maintainers.is_subset(authorizers) {
        failed.note(
            node_id,
            FailedAuthorization::LookupByKeyMissingAuthorization {
                template_id: lookup.template_id.clone(),
                location: lookup.location.clone(),
                authorizing_parties: authorizers.clone(),
                maintainers: lookup.key.maintainers.clone(),
            },
        );
    }
}
