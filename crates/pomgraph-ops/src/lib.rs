pub mod ops_module;
pub mod ops_repos;
pub mod ops_resolve;
pub mod ops_tree;
