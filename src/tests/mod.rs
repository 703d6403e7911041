//! Cross-module scenario tests for the control loop.
