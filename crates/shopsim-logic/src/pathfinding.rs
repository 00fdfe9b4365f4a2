//! BFS pathfinding over the 4-connected shop grid.
//!
//! The grid is small (20x12 by default), so an unadorned breadth-first
//! search is both the simplest and a shortest-path-correct choice. Blocked
//! tiles (placed fixtures) and out-of-bounds tiles are never entered.

use std::collections::{HashMap, VecDeque};

use crate::grid::{Tile, WalkGrid};

/// Find the shortest path from `start` to `goal`.
///
/// Returns the sequence of tiles to step through, excluding `start` and
/// ending with `goal`. Returns an empty path if `start == goal`, and `None`
/// if `goal` is blocked or unreachable.
pub fn bfs_path(grid: &WalkGrid, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
    if start == goal {
        return Some(Vec::new());
    }
    if !grid.is_walkable(goal) {
        return None;
    }

    let mut queue = VecDeque::new();
    let mut prev: HashMap<Tile, Tile> = HashMap::new();
    queue.push_back(start);
    prev.insert(start, start);

    let mut found = false;
    while let Some(cur) = queue.pop_front() {
        if cur == goal {
            found = true;
            break;
        }
        for next in cur.neighbors() {
            if prev.contains_key(&next) || !grid.is_walkable(next) {
                continue;
            }
            prev.insert(next, cur);
            queue.push_back(next);
        }
    }
    if !found {
        return None;
    }

    // Walk predecessors back from the goal.
    let mut path = Vec::new();
    let mut cur = goal;
    while cur != start {
        path.push(cur);
        cur = prev[&cur];
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn open_grid(w: i32, h: i32) -> WalkGrid {
        WalkGrid::new((w, h), HashSet::new())
    }

    #[test]
    fn same_tile_is_empty_path() {
        let grid = open_grid(5, 5);
        assert_eq!(bfs_path(&grid, Tile::new(2, 2), Tile::new(2, 2)), Some(vec![]));
    }

    #[test]
    fn straight_line() {
        let grid = open_grid(5, 1);
        let path = bfs_path(&grid, Tile::new(0, 0), Tile::new(3, 0)).unwrap();
        assert_eq!(path, vec![Tile::new(1, 0), Tile::new(2, 0), Tile::new(3, 0)]);
    }

    #[test]
    fn path_length_is_manhattan_on_open_grid() {
        let grid = open_grid(10, 10);
        let start = Tile::new(1, 1);
        let goal = Tile::new(7, 4);
        let path = bfs_path(&grid, start, goal).unwrap();
        assert_eq!(path.len() as i32, start.manhattan(goal));
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn routes_around_a_wall() {
        // Vertical wall at x=2 with a gap at y=4.
        let mut blocked = HashSet::new();
        for y in 0..4 {
            blocked.insert(Tile::new(2, y));
        }
        let grid = WalkGrid::new((5, 5), blocked);
        let path = bfs_path(&grid, Tile::new(0, 0), Tile::new(4, 0)).unwrap();
        assert_eq!(*path.last().unwrap(), Tile::new(4, 0));
        // Must detour through the gap row.
        assert!(path.iter().any(|t| t.y == 4));
        for step in &path {
            assert!(grid.is_walkable(*step));
        }
    }

    #[test]
    fn unreachable_returns_none() {
        // Goal fully enclosed.
        let mut blocked = HashSet::new();
        for t in Tile::new(3, 3).neighbors() {
            blocked.insert(t);
        }
        let grid = WalkGrid::new((7, 7), blocked);
        assert_eq!(bfs_path(&grid, Tile::new(0, 0), Tile::new(3, 3)), None);
    }

    #[test]
    fn blocked_goal_returns_none() {
        let mut blocked = HashSet::new();
        blocked.insert(Tile::new(2, 2));
        let grid = WalkGrid::new((5, 5), blocked);
        assert_eq!(bfs_path(&grid, Tile::new(0, 0), Tile::new(2, 2)), None);
    }

    #[test]
    fn out_of_bounds_goal_returns_none() {
        let grid = open_grid(5, 5);
        assert_eq!(bfs_path(&grid, Tile::new(0, 0), Tile::new(9, 9)), None);
    }

    #[test]
    fn steps_are_orthogonally_contiguous() {
        let grid = open_grid(8, 8);
        let start = Tile::new(0, 7);
        let path = bfs_path(&grid, start, Tile::new(6, 1)).unwrap();
        let mut cur = start;
        for step in path {
            assert_eq!(cur.manhattan(step), 1);
            cur = step;
        }
    }
}
