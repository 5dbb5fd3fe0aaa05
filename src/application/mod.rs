// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only. Each use case wires the data,
// ml and infra layers together for one goal:
//
//   train_use_case    — fine-tune the head and save the model
//   evaluate_use_case — score a saved model on a test split
//
// No tensor maths and no printing to the terminal here.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The fine-tuning workflow
pub mod train_use_case;

// Reload a saved model and evaluate it
pub mod evaluate_use_case;
