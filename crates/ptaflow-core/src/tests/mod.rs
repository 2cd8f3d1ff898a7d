/*! Test coverage for the program model.
 *
 * The analysis trusts the model to number instructions densely, to intern constants and to report
 * consumers in program order. These tests pin that behavior down through the public builders so
 * that a change in the model shows up here before it shows up as a wrong points-to set.
 */

#![allow(unused_imports)]
#![allow(unused_variables)]

mod builder_api_tests;
