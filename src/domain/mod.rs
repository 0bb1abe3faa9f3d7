// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The order lifecycle is the only aggregate with real state-transition
// logic in this system; users and products are thin collaborator records
// owned elsewhere (see `models` and `store`).
//
// ============================================================================

pub mod order;
