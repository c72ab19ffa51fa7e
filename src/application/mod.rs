// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per command (init, predict, project, demo).
//
// Rules for this layer:
//   - No ML math or solver code here
//   - No printing here (that's Layer 1)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Use cases are generic over the Burn backend; Layer 1 picks
// the concrete one.

// Every constructor argument of the model, persisted with it
pub mod model_settings;

// Fresh checkpoint creation
pub mod init_use_case;

// Checkpoint → input window → projected outputs
pub mod predict_use_case;

// Standalone box projection of a raw vector
pub mod project_use_case;

// Forward/backward smoke run on generated data
pub mod demo_use_case;
