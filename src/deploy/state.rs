// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid state transitions at compile time.

/// Initial state: descriptor accepted, execution id generated.
/// Available actions: `resolve_template()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Template resolved: body inlined or uploaded and referenced by URL.
/// Available actions: `create_change_set()`
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateResolved;

/// Change set computed and non-empty, ready to execute.
/// Available actions: `execute()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeSetReady;

/// Change set executed: stack update in flight.
/// Available actions: `wait_for_completion()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Executed;
