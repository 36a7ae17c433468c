//! Per-tick world snapshot handed to every query.
//! The policy layer owns and mutates this value between ticks; queries only read it.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::types::{AgentId, ExplosiveId, GridCoord, WorldPos};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: WorldPos,
    /// Cells moved per tick, 1 to 3.
    pub speed: u8,
    pub blast_range: u8,
    pub bomb_allowance: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explosive {
    pub id: ExplosiveId,
    pub owner: AgentId,
    pub cell: GridCoord,
    pub detonates_at_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub grid: Grid,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub explosives: Vec<Explosive>,
    #[serde(default)]
    pub now_ms: u64,
}

impl World {
    pub fn new(grid: Grid) -> Self {
        Self { grid, agents: Vec::new(), explosives: Vec::new(), now_ms: 0 }
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn explosive(&self, id: ExplosiveId) -> Option<&Explosive> {
        self.explosives.iter().find(|explosive| explosive.id == id)
    }

    pub fn has_explosive_at(&self, cell: GridCoord) -> bool {
        self.explosives.iter().any(|explosive| explosive.cell == cell)
    }

    /// Inserts or replaces an agent by id.
    pub fn upsert_agent(&mut self, agent: Agent) {
        match self.agents.iter_mut().find(|existing| existing.id == agent.id) {
            Some(existing) => *existing = agent,
            None => self.agents.push(agent),
        }
    }

    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        let idx = self.agents.iter().position(|agent| agent.id == id)?;
        Some(self.agents.remove(idx))
    }

    /// Removes a detonated explosive and clears the obstacles its blast reached.
    /// Returns the cells whose obstacle was destroyed.
    pub fn apply_detonation(&mut self, id: ExplosiveId, blast: &[GridCoord]) -> Vec<GridCoord> {
        self.explosives.retain(|explosive| explosive.id != id);
        blast.iter().copied().filter(|cell| self.grid.destroy_obstacle(*cell)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: u64, x: f64, y: f64) -> Agent {
        Agent {
            id: AgentId(id),
            position: WorldPos::new(x, y),
            speed: 1,
            blast_range: 2,
            bomb_allowance: 1,
        }
    }

    #[test]
    fn upsert_replaces_existing_agent() {
        let mut world = World::new(Grid::new(3, 3));
        world.upsert_agent(agent(1, 0.0, 0.0));
        world.upsert_agent(agent(2, 40.0, 0.0));
        world.upsert_agent(agent(1, 80.0, 80.0));

        assert_eq!(world.agents.len(), 2);
        assert_eq!(world.agent(AgentId(1)).map(|a| a.position), Some(WorldPos::new(80.0, 80.0)));
        assert!(world.remove_agent(AgentId(2)).is_some());
        assert!(world.agent(AgentId(2)).is_none());
    }

    #[test]
    fn detonation_clears_only_obstacles_and_removes_explosive() {
        let mut world = World::new(Grid::from_rows(&["C.W", "..."]).expect("valid layout"));
        world.explosives.push(Explosive {
            id: ExplosiveId(7),
            owner: AgentId(1),
            cell: GridCoord::new(1, 0),
            detonates_at_ms: 3000,
        });

        let blast = [GridCoord::new(1, 0), GridCoord::new(0, 0), GridCoord::new(2, 0)];
        let destroyed = world.apply_detonation(ExplosiveId(7), &blast);

        assert_eq!(destroyed, vec![GridCoord::new(0, 0)]);
        assert!(world.explosives.is_empty());
        assert_eq!(world.grid.to_rows(), vec!["..W".to_string(), "...".to_string()]);
    }

    #[test]
    fn snapshot_deserializes_from_json() {
        let json = r#"{
            "grid": ["W..", ".C."],
            "agents": [{"id": 1, "position": {"x": 40.0, "y": 0.0}, "speed": 2, "blast_range": 3, "bomb_allowance": 1}],
            "explosives": [{"id": 9, "owner": 1, "cell": {"row": 1, "col": 0}, "detonates_at_ms": 2500}],
            "now_ms": 1000
        }"#;
        let world: World = serde_json::from_str(json).expect("snapshot should parse");
        assert_eq!(world.grid.width(), 3);
        assert_eq!(world.agent(AgentId(1)).map(|a| a.speed), Some(2));
        assert!(world.has_explosive_at(GridCoord::new(0, 1)));
        assert_eq!(world.now_ms, 1000);
    }
}
