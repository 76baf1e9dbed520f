//! Integration tests for the dispatch proxy and table: cut batch
//! atomicity, the Add/Replace/Remove invariants, selector resolution, and
//! whole-call state rollback.

use meridian_contracts::{
    Call, ContractError, Diamond, DispatchError, Facet, FacetCut, GetterFacet, MasternodeFacet,
    Selector, VaultFacet, MRD,
};

fn deploy_bare() -> (Diamond, String) {
    let mut diamond = Diamond::new("admin");
    let masternode = diamond.install(Box::new(MasternodeFacet));
    (diamond, masternode)
}

fn initialize_masternode(diamond: &mut Diamond) {
    diamond
        .execute(
            "admin",
            0,
            Call::InitializeMasternode {
                min_deposit: 1_000 * MRD,
                fee_recipient: "fee_recipient".into(),
                metadata_uri: "node.meridian.uri".into(),
            },
        )
        .unwrap();
}

// ---------------------------------------------------------------------------
// Cut semantics
// ---------------------------------------------------------------------------

#[test]
fn add_routes_selectors() {
    let (mut diamond, masternode) = deploy_bare();
    assert!(diamond.table().is_empty());

    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();
    assert_eq!(diamond.table().len(), MasternodeFacet.selectors().len());

    initialize_masternode(&mut diamond);
    diamond.fund("alice", 10_000 * MRD);
    diamond
        .execute("alice", 1_000 * MRD, Call::MintMasternode)
        .unwrap();
}

#[test]
fn add_existing_selector_rejected() {
    let (mut diamond, masternode) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();

    let err = diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::SelectorAlreadyRegistered(_))
    ));
}

#[test]
fn replace_requires_existing_mapping() {
    let (mut diamond, masternode) = deploy_bare();
    let err = diamond
        .cut(
            "admin",
            &[FacetCut::replace(&masternode, MasternodeFacet.selectors())],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::SelectorNotRegistered(_))
    ));
}

#[test]
fn replace_reroutes_to_the_new_module() {
    let (mut diamond, masternode_v1) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode_v1, MasternodeFacet.selectors())])
        .unwrap();
    initialize_masternode(&mut diamond);
    diamond.fund("alice", 10_000 * MRD);
    diamond
        .execute("alice", 1_000 * MRD, Call::MintMasternode)
        .unwrap();

    // "Upgrade": a fresh module instance takes over the same selectors and
    // keeps operating on the same storage — ids continue the sequence.
    let masternode_v2 = diamond.install(Box::new(MasternodeFacet));
    diamond
        .cut(
            "admin",
            &[FacetCut::replace(&masternode_v2, MasternodeFacet.selectors())],
        )
        .unwrap();

    let receipt = diamond
        .execute("alice", 1_000 * MRD, Call::MintMasternode)
        .unwrap();
    assert_eq!(receipt.output.as_token_id(), Some(2));
}

#[test]
fn remove_unroutes_selectors() {
    let (mut diamond, masternode) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();
    diamond
        .cut("admin", &[FacetCut::remove(MasternodeFacet.selectors())])
        .unwrap();
    assert!(diamond.table().is_empty());

    let err = diamond
        .execute("alice", 0, Call::MasternodeBalanceOf { owner: "alice".into() })
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::FunctionNotFound(_))
    ));
}

#[test]
fn remove_unmapped_selector_rejected() {
    let (mut diamond, _) = deploy_bare();
    let err = diamond
        .cut("admin", &[FacetCut::remove(vec![Selector::of("bogus()")])])
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::SelectorNotRegistered(_))
    ));
}

#[test]
fn failed_batch_leaves_the_table_untouched() {
    let (mut diamond, masternode) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();
    let before = diamond.table().clone();

    // Entry 1 is valid on its own; entry 2 violates the Add invariant.
    let getters = diamond.install(Box::new(GetterFacet));
    let err = diamond
        .cut(
            "admin",
            &[
                FacetCut::add(&getters, GetterFacet.selectors()),
                FacetCut::add(&masternode, MasternodeFacet.selectors()),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::SelectorAlreadyRegistered(_))
    ));

    // Nothing from the batch landed — not even the valid first entry.
    assert_eq!(diamond.table(), &before);
    assert!(diamond
        .execute("observer", 0, Call::GetMinMasternode)
        .is_err());
}

#[test]
fn batch_entries_apply_in_order() {
    let (mut diamond, masternode) = deploy_bare();
    // Add then Remove in one batch: legal, and nets out to an empty table.
    diamond
        .cut(
            "admin",
            &[
                FacetCut::add(&masternode, MasternodeFacet.selectors()),
                FacetCut::remove(MasternodeFacet.selectors()),
            ],
        )
        .unwrap();
    assert!(diamond.table().is_empty());
}

#[test]
fn cut_requires_admin() {
    let (mut diamond, masternode) = deploy_bare();
    let err = diamond
        .cut("mallory", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::Unauthorized { .. })
    ));
    assert!(diamond.table().is_empty());
}

#[test]
fn cut_rejects_uninstalled_facets() {
    let (mut diamond, _) = deploy_bare();
    let err = diamond
        .cut(
            "admin",
            &[FacetCut::add("facet:deadbeef", MasternodeFacet.selectors())],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::Dispatch(DispatchError::UnknownFacet(_))
    ));
}

// ---------------------------------------------------------------------------
// Shared storage across modules
// ---------------------------------------------------------------------------

#[test]
fn modules_share_one_state() {
    let mut diamond = Diamond::new("admin");
    let masternode = diamond.install(Box::new(MasternodeFacet));
    let vault = diamond.install(Box::new(VaultFacet));
    let getters = diamond.install(Box::new(GetterFacet));
    diamond
        .cut(
            "admin",
            &[
                FacetCut::add(&masternode, MasternodeFacet.selectors()),
                FacetCut::add(&vault, VaultFacet.selectors()),
                FacetCut::add(&getters, GetterFacet.selectors()),
            ],
        )
        .unwrap();
    initialize_masternode(&mut diamond);
    diamond.fund("alice", 10_000 * MRD);
    diamond
        .execute("alice", 1_000 * MRD, Call::MintMasternode)
        .unwrap();

    // The getter facet reads what the masternode facet wrote.
    let min = diamond
        .execute("observer", 0, Call::GetMinMasternode)
        .unwrap();
    assert_eq!(min.output.as_amount(), Some(1_000 * MRD));
    let data = diamond
        .execute("observer", 0, Call::GetNodeData { id: 1 })
        .unwrap();
    assert_eq!(data.output.as_node().unwrap().owner, "alice");
}

// ---------------------------------------------------------------------------
// Atomic calls
// ---------------------------------------------------------------------------

#[test]
fn failed_call_reverts_everything() {
    let (mut diamond, masternode) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();
    initialize_masternode(&mut diamond);
    diamond.fund("alice", 10_000 * MRD);

    let state_before = diamond.state().clone();
    let log_len_before = diamond.log().len();

    // Fails inside the handler, after the payable deposit was credited.
    let err = diamond
        .execute("alice", 500 * MRD, Call::MintMasternode)
        .unwrap_err();
    assert!(matches!(err, ContractError::Masternode(_)));

    assert_eq!(diamond.state(), &state_before);
    assert_eq!(diamond.log().len(), log_len_before);
    assert_eq!(diamond.native_balance_of("alice"), 10_000 * MRD);
}

#[test]
fn payable_call_requires_caller_funds() {
    let (mut diamond, masternode) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();
    initialize_masternode(&mut diamond);

    // Alice was never funded; the payable debit itself fails.
    let err = diamond
        .execute("alice", 1_000 * MRD, Call::MintMasternode)
        .unwrap_err();
    assert!(matches!(err, ContractError::Bank(_)));
    assert!(diamond
        .execute("alice", 0, Call::MasternodeOwnerOf { id: 1 })
        .is_err());
}

#[test]
fn events_commit_only_on_success() {
    let (mut diamond, masternode) = deploy_bare();
    diamond
        .cut("admin", &[FacetCut::add(&masternode, MasternodeFacet.selectors())])
        .unwrap();
    initialize_masternode(&mut diamond);
    diamond.fund("alice", 10_000 * MRD);

    let receipt = diamond
        .execute("alice", 1_000 * MRD, Call::MintMasternode)
        .unwrap();
    assert_eq!(receipt.events.len(), 1);
    assert_eq!(diamond.log().len(), 1);

    let _ = diamond
        .execute("alice", 1, Call::MintMasternode)
        .unwrap_err();
    assert_eq!(diamond.log().len(), 1);
}
