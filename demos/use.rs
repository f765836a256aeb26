use avltree::AvlTree;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn main() {
    TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    let mut tree = AvlTree::new();
    for key in 1..=7 {
        tree.insert(key);
    }
    println!("{tree}");
    assert_eq!(tree.height(), 2);

    tree.insert(4);
    assert_eq!(tree.count(&4), 2);
    tree.remove(&4);
    tree.remove(&100);
    assert!(tree.assert_avl_property());

    print!("{{ ");
    for key in &tree {
        print!("{key}, ");
    }
    println!("}}");

    tree.clear();
    println!("{tree}");
}
