
#[cfg(test)]
mod case_create_tests;


#[cfg(test)]
mod case_fields_tests;

#[cfg(test)]
mod case_status_tests;

#[cfg(test)]
mod case_assign_tests;

#[cfg(test)]
mod duplicate_vrm_tests;


#[cfg(test)]
mod public_report_tests;
