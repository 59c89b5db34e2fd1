mod job_profile;

pub use job_profile::JobProfile;
