use crumbparty_game::board::layouts;
use crumbparty_game::{
    BoardPosition, DirectionalChoice, FirstCandidate, Player, PlayerId, RandomChoice, TileType,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn builtin_boards_build_and_are_connected() {
    for name in layouts::names() {
        let board = layouts::builtin(name).unwrap();
        assert!(!board.is_empty(), "{name} has tiles");
        assert!(board.unreachable_tiles().is_empty(), "{name} is connected");
        for index in 0..board.len() {
            assert!(!board.neighbors_of(index).is_empty(), "{name}:{index}");
        }
    }
}

#[test]
fn dead_end_sends_the_token_back() {
    let board = layouts::builtin("crossroads").unwrap();
    assert_eq!(board.neighbors_of(10), &[9]);
    assert_eq!(board.tile_at(10).unwrap().kind, TileType::Shop);

    let outcome = board
        .advance(BoardPosition::new(9, Some(4)), 2, &mut FirstCandidate)
        .unwrap();
    assert_eq!(outcome.path, vec![10, 9]);
    assert_eq!(outcome.position, BoardPosition::new(9, Some(10)));

    let outcome = board
        .advance(outcome.position, 1, &mut FirstCandidate)
        .unwrap();
    assert_eq!(outcome.landed(), 4);
}

#[test]
fn crossroads_colors_follow_the_board_mapping() {
    let board = layouts::builtin("crossroads").unwrap();
    assert_eq!(board.tile_at(1).unwrap().kind, TileType::Minigame);
    assert_eq!(board.tile_at(3).unwrap().kind, TileType::Shop);
    assert_eq!(board.tile_at(0).unwrap().kind, TileType::Regular);
}

#[test]
fn held_direction_picks_the_meadow_shortcut() {
    let board = layouts::builtin("meadow").unwrap();
    assert!(board.is_junction(2));
    let at_junction = BoardPosition::new(2, Some(1));
    let origin = board.tile_at(2).unwrap();

    for candidate in board.candidates(at_junction) {
        let tile = board.tile_at(candidate).unwrap();
        let axis = (tile.x - origin.x, tile.y - origin.y);
        let next = board
            .step(at_junction, &mut DirectionalChoice::new(axis))
            .unwrap();
        assert_eq!(next.current, candidate);
    }

    let idle = board
        .step(at_junction, &mut DirectionalChoice::default())
        .unwrap();
    assert_eq!(idle.current, 3);
}

#[test]
fn random_walks_never_leave_the_board_or_reverse_mid_path() {
    for name in layouts::names() {
        let board = layouts::builtin(name).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let mut player = Player::new(PlayerId::new(1).unwrap(), "Walker");
        for _ in 0..500 {
            let roll = 1 + (player.current_tile as u32 % 6);
            let before = BoardPosition::of(&player);
            let outcome = board
                .advance_player(&mut player, roll, &mut RandomChoice::new(&mut rng))
                .unwrap();
            assert_eq!(outcome.path.len() as u32, roll);
            assert!(outcome.landed() < board.len());
            assert_eq!(player.current_tile, outcome.landed());

            let mut position = before;
            for &next in &outcome.path {
                let neighbors = board.neighbors_of(position.current);
                assert!(neighbors.contains(&next));
                if neighbors.len() > 1 {
                    assert_ne!(Some(next), position.previous, "{name}: reversed at {next}");
                }
                position = BoardPosition::new(next, Some(position.current));
            }
        }
    }
}
