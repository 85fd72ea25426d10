//! Application record management: registering applications with the
//! directory and looking them up again.

use opcua_types::{ExtensionObject, NodeId, Variant};

use crate::{ids, ApplicationRecordDataType, GdsError};

use super::{optional_array_arg, output_arg, GdsClient};

impl GdsClient {
    /// Register an application with the directory, returning the application
    /// id the server assigned to the record. The `application_id` field of
    /// the submitted record is ignored by the server.
    pub async fn register_application(
        &self,
        application: ApplicationRecordDataType,
    ) -> Result<NodeId, GdsError> {
        const METHOD: &str = "RegisterApplication";
        let outputs = self
            .call_directory_elevated(
                ids::methods::DIRECTORY_REGISTER_APPLICATION,
                vec![Variant::from(ExtensionObject::new(application))],
            )
            .await?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// Replace the stored record for an already registered application. The
    /// record's `application_id` selects which registration to update.
    pub async fn update_application(
        &self,
        application: ApplicationRecordDataType,
    ) -> Result<(), GdsError> {
        self.call_directory_elevated(
            ids::methods::DIRECTORY_UPDATE_APPLICATION,
            vec![Variant::from(ExtensionObject::new(application))],
        )
        .await?;
        Ok(())
    }

    /// Remove an application's registration from the directory.
    pub async fn unregister_application(&self, application_id: &NodeId) -> Result<(), GdsError> {
        self.call_directory_elevated(
            ids::methods::DIRECTORY_UNREGISTER_APPLICATION,
            vec![application_id.clone().into()],
        )
        .await?;
        Ok(())
    }

    /// Fetch the record registered under `application_id`.
    pub async fn get_application(
        &self,
        application_id: &NodeId,
    ) -> Result<ApplicationRecordDataType, GdsError> {
        const METHOD: &str = "GetApplication";
        let outputs = self
            .call_directory(
                ids::methods::DIRECTORY_GET_APPLICATION,
                vec![application_id.clone().into()],
            )
            .await?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// All records registered under an application URI. An application URI
    /// is supposed to be globally unique, but the directory does not enforce
    /// that, so this returns every record that claims it. An empty result
    /// means the URI is unknown, which is not an error.
    pub async fn find_applications(
        &self,
        application_uri: &str,
    ) -> Result<Vec<ApplicationRecordDataType>, GdsError> {
        const METHOD: &str = "FindApplications";
        let outputs = self
            .call_directory(
                ids::methods::DIRECTORY_FIND_APPLICATIONS,
                vec![application_uri.into()],
            )
            .await?;
        optional_array_arg(&mut outputs.into_iter(), METHOD)
    }
}
