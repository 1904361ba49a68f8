//! End-to-end flows over the in-memory repository: permission resolution,
//! ordering plans, atomic commits, and post-commit side effects together.

use boardwalk_core::test_support::{BoardFixture, MemoryRepository};
use boardwalk_core::{
    permission, BoardHierarchyService, BoardRole, EntityRepository, ErrorKind, ListCardOrder,
    UserId, Visibility, WorkspaceRole,
};
use std::sync::Arc;

fn service(fixture: &BoardFixture) -> BoardHierarchyService<MemoryRepository> {
    BoardHierarchyService::new(
        fixture.repo.clone(),
        fixture.activity.clone(),
        fixture.cache.clone(),
    )
}

async fn card_names_in(fixture: &BoardFixture, list_index: usize) -> Vec<String> {
    fixture
        .repo
        .cards_in_list(&fixture.lists[list_index].id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect()
}

async fn assert_contiguous(fixture: &BoardFixture, list_index: usize) {
    let cards = fixture
        .repo
        .cards_in_list(&fixture.lists[list_index].id)
        .await
        .unwrap();
    for (index, card) in cards.iter().enumerate() {
        assert_eq!(card.order, index, "card {} out of place", card.name);
    }
}

#[tokio::test]
async fn test_board_editing_session_keeps_orders_dense() {
    let fixture = BoardFixture::new().with_workspace_member("wanda", WorkspaceRole::Member);
    let svc = service(&fixture);
    let wanda = UserId::from_string("wanda");

    // wanda fills the To Do list
    for name in ["Design", "Build", "Test", "Ship"] {
        svc.create_card(&wanda, &fixture.lists[0].id, name, None)
            .await
            .unwrap();
    }
    assert_eq!(card_names_in(&fixture, 0).await, vec!["Design", "Build", "Test", "Ship"]);

    // Insert at the front, move one to the middle, pull one into Doing
    let urgent = svc
        .create_card(&wanda, &fixture.lists[0].id, "Hotfix", Some(0))
        .await
        .unwrap();
    assert_eq!(urgent.order, 0);
    assert_contiguous(&fixture, 0).await;

    let cards = fixture.repo.cards_in_list(&fixture.lists[0].id).await.unwrap();
    let ship = cards.iter().find(|c| c.name == "Ship").unwrap().clone();
    svc.move_card(&wanda, &ship.id, &fixture.lists[0].id, Some(1))
        .await
        .unwrap();
    assert_eq!(
        card_names_in(&fixture, 0).await,
        vec!["Hotfix", "Ship", "Design", "Build", "Test"]
    );

    let hotfix = fixture.repo.get_card(&urgent.id).unwrap();
    svc.move_card(&wanda, &hotfix.id, &fixture.lists[1].id, None)
        .await
        .unwrap();
    assert_contiguous(&fixture, 0).await;
    assert_contiguous(&fixture, 1).await;
    assert_eq!(card_names_in(&fixture, 1).await, vec!["Hotfix"]);

    // Every mutation left a record and invalidated the board snapshot
    let actions = fixture.activity.actions();
    assert_eq!(actions.iter().filter(|a| *a == "create card").count(), 5);
    assert_eq!(actions.iter().filter(|a| *a == "move card").count(), 2);
    assert_eq!(fixture.cache.invalidated().len(), actions.len());
}

#[tokio::test]
async fn test_bulk_reorder_matches_drag_and_drop_end_state() {
    let fixture = BoardFixture::new();
    let svc = service(&fixture);

    let a = fixture.seed_card(0, "A");
    let b = fixture.seed_card(0, "B");
    let c = fixture.seed_card(0, "C");

    svc.bulk_reorder_cards(
        &fixture.owner,
        &[ListCardOrder {
            list_id: fixture.lists[0].id.clone(),
            ordered_card_ids: vec![c.id.clone(), a.id.clone(), b.id.clone()],
        }],
    )
    .await
    .unwrap();
    assert_eq!(card_names_in(&fixture, 0).await, vec!["C", "A", "B"]);

    // Replaying the same end state is a no-op that still succeeds
    svc.bulk_reorder_cards(
        &fixture.owner,
        &[ListCardOrder {
            list_id: fixture.lists[0].id.clone(),
            ordered_card_ids: vec![c.id.clone(), a.id.clone(), b.id.clone()],
        }],
    )
    .await
    .unwrap();
    assert_eq!(card_names_in(&fixture, 0).await, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_archival_state_machine() {
    let fixture = BoardFixture::new();
    let svc = service(&fixture);
    let card = fixture.seed_card(0, "Doomed");

    // Active -> Archived -> Active -> Archived -> Deleted
    svc.archive_card(&fixture.owner, &card.id).await.unwrap();
    svc.restore_card(&fixture.owner, &card.id).await.unwrap();
    svc.archive_card(&fixture.owner, &card.id).await.unwrap();

    // Archived card rejects edits but still occupies its order slot
    let err = svc
        .move_card(&fixture.owner, &card.id, &fixture.lists[1].id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    svc.delete_card(&fixture.owner, &card.id).await.unwrap();
    assert!(fixture.repo.get_card(&card.id).is_none());
}

#[tokio::test]
async fn test_permission_matrix_over_loaded_chains() {
    let fixture = BoardFixture::new()
        .with_workspace_member("wanda", WorkspaceRole::Member)
        .with_workspace_member("vera", WorkspaceRole::Viewer)
        .with_board_member("gus", BoardRole::Guest);

    let chain = fixture.repo.board_chain(&fixture.board.id).await.unwrap();

    let owner = permission::resolve(&fixture.owner, &chain);
    assert!(owner.can_read && owner.can_write && owner.can_administer);

    let wanda = permission::resolve(&UserId::from_string("wanda"), &chain);
    assert!(wanda.can_read && wanda.can_write && !wanda.can_administer);

    let vera = permission::resolve(&UserId::from_string("vera"), &chain);
    assert!(vera.can_read && !vera.can_write);

    let gus = permission::resolve(&UserId::from_string("gus"), &chain);
    assert!(gus.can_read && !gus.can_write);

    let mallory = permission::resolve(&UserId::from_string("mallory"), &chain);
    assert!(!mallory.can_read);
}

#[tokio::test]
async fn test_public_board_is_readable_but_locked() {
    let fixture = BoardFixture::new().with_visibility(Visibility::Public);
    let svc = service(&fixture);
    let mallory = UserId::from_string("mallory");

    let chain = fixture.repo.board_chain(&fixture.board.id).await.unwrap();
    let access = permission::resolve(&mallory, &chain);
    assert!(access.can_read);

    // Readable means Forbidden (not NotFound) on write attempts
    let err = svc
        .create_list(&mallory, &fixture.board.id, "Graffiti", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_failed_batch_changes_nothing() {
    let fixture = BoardFixture::new();
    let svc = service(&fixture);
    let a = fixture.seed_card(0, "A");
    let b = fixture.seed_card(0, "B");

    // A reorder payload missing one sibling is rejected before any write
    let err = svc
        .bulk_reorder_cards(
            &fixture.owner,
            &[ListCardOrder {
                list_id: fixture.lists[0].id.clone(),
                ordered_card_ids: vec![b.id.clone()],
            }],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOrder);
    assert_eq!(fixture.repo.get_card(&a.id).unwrap().order, 0);
    assert_eq!(fixture.repo.get_card(&b.id).unwrap().order, 1);
    assert!(fixture.activity.entries().is_empty());
}

#[tokio::test]
async fn test_services_share_one_repository() {
    // The hierarchy and membership services observe each other's commits
    let fixture = BoardFixture::new();
    let hierarchy = service(&fixture);
    let members = boardwalk_core::MembershipService::new(
        fixture.repo.clone(),
        fixture.activity.clone(),
        fixture.cache.clone(),
    );
    let bob = UserId::from_string("bob");

    members
        .add_workspace_member(&fixture.owner, &fixture.workspace.id, &bob, WorkspaceRole::Member)
        .await
        .unwrap();

    // bob can now create cards through the workspace access path
    let card = hierarchy
        .create_card(&bob, &fixture.lists[0].id, "Bob's card", None)
        .await
        .unwrap();
    assert_eq!(card.order, 0);

    members
        .remove_workspace_member(&fixture.owner, &fixture.workspace.id, &bob)
        .await
        .unwrap();
    let err = hierarchy
        .create_card(&bob, &fixture.lists[0].id, "Too late", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_fixture_collaborators_are_shareable() {
    // Arc'd collaborators can be handed to several services at once
    let fixture = BoardFixture::new();
    let repo: Arc<MemoryRepository> = fixture.repo.clone();
    let svc_a = BoardHierarchyService::new(repo.clone(), fixture.activity.clone(), fixture.cache.clone());
    let svc_b = BoardHierarchyService::new(repo, fixture.activity.clone(), fixture.cache.clone());

    svc_a
        .create_list(&fixture.owner, &fixture.board.id, "From A", None)
        .await
        .unwrap();
    svc_b
        .create_list(&fixture.owner, &fixture.board.id, "From B", None)
        .await
        .unwrap();

    let lists = fixture.repo.lists_in_board(&fixture.board.id).await.unwrap();
    assert_eq!(lists.len(), 5);
    assert_eq!(lists[4].name, "From B");
}
