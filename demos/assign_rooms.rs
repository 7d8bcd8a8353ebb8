use billet::{
    assign_by_category, assign_randomly, AssignmentSummary, Assigner, Category, GroupGenerator,
    Louvain, PersonRecord, SocialGraph, SplitConfig,
};
use std::collections::HashMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Run with RUST_LOG=debug to follow the engine pass by pass.
    env_logger::init();

    // Twelve friend circles of five, each circle also knowing one person of
    // the next circle. Circles alternate between the two categories.
    let mut records: Vec<PersonRecord<u32>> = Vec::new();
    for circle in 0..12u32 {
        let category = if circle % 2 == 0 { Category::A } else { Category::B };
        for i in 0..5 {
            let id = circle * 5 + i;
            let mut connections: Vec<u32> = (id + 1..circle * 5 + 5).collect();
            if i == 0 && circle + 2 < 12 {
                connections.push((circle + 2) * 5);
            }
            records.push(PersonRecord {
                id,
                connections,
                category: Some(category),
                answers: Vec::new(),
            });
        }
    }
    let graph = SocialGraph::from_records(&records)?;
    let categories: HashMap<u32, Category> = billet::categories_of(&records);

    let groups = GroupGenerator::new()
        .with_capacity_range(2..=6)
        .with_category(Category::Unrestricted)
        .with_seed(7)
        .generate::<u32>(graph.node_count() + 10)?;

    let mut random_groups = groups.clone();
    assign_randomly(&graph, &mut random_groups, Some(7))?;

    let result = assign_by_category(
        &graph,
        |p| categories.get(p).copied(),
        groups,
        &Assigner::new(Louvain::new()),
        &SplitConfig::new(),
    )?;
    for shortfall in &result.shortfalls {
        println!("warning: {shortfall}");
    }
    let groups = result.into_groups();

    println!("n_people={} n_connections={}", graph.node_count(), graph.edge_count());
    println!("-- community assignment");
    println!("{}", AssignmentSummary::evaluate(&graph, &groups));
    println!("-- random baseline");
    println!("{}", AssignmentSummary::evaluate(&graph, &random_groups));

    for group in groups.iter().filter(|g| g.occupied() > 0) {
        println!("  {group}: {:?}", group.members());
    }

    Ok(())
}
