use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, sleep};
use tracing::debug;

use super::{Actor, deadline_after, not_found_as};
use crate::ActionOutcome;
use crate::ccv3::ScaleRequest;
use crate::error::ActionError;
use crate::resources::{InstanceState, Process, ProcessSummary};
use crate::warnings::Warnings;

impl Actor {
    pub(crate) async fn process_summaries(
        &self,
        app_guid: &str,
        warnings: &mut Warnings,
    ) -> Result<Vec<ProcessSummary>, ActionError> {
        let processes = self.cc.get_application_processes(app_guid, warnings).await?;
        let mut summaries = Vec::with_capacity(processes.len());
        for process in processes {
            let instances = self.cc.get_process_instances(&process.guid, warnings).await?;
            summaries.push(ProcessSummary { process, instances });
        }
        Ok(summaries)
    }

    /// Scale one process of an app.
    pub async fn scale_process_by_application(
        &self,
        app_guid: &str,
        process_type: &str,
        scale: ScaleRequest,
    ) -> ActionOutcome<Process> {
        let mut warnings = Warnings::new();
        let result = self
            .cc
            .scale_application_process(app_guid, process_type, &scale, &mut warnings)
            .await
            .map_err(|err| {
                not_found_as(err, || ActionError::ProcessNotFound {
                    process_type: process_type.to_string(),
                })
            });
        (result, warnings)
    }

    /// Stop one instance so the platform restarts it.
    pub async fn delete_instance_by_application_name_space_process_type_and_index(
        &self,
        app_name: &str,
        space_guid: &str,
        process_type: &str,
        index: u32,
    ) -> ActionOutcome<()> {
        let mut warnings = Warnings::new();
        let result = async {
            let app = self.application_by_name(app_name, space_guid, &mut warnings).await?;
            let processes = self
                .cc
                .get_application_processes(&app.guid, &mut warnings)
                .await?;
            if !processes.iter().any(|p| p.process_type == process_type) {
                return Err(ActionError::ProcessNotFound {
                    process_type: process_type.to_string(),
                });
            }
            self.cc
                .delete_application_process_instance(&app.guid, process_type, index, &mut warnings)
                .await
                .map_err(|err| {
                    not_found_as(err, || ActionError::ProcessInstanceNotFound {
                        process_type: process_type.to_string(),
                        index,
                    })
                })
        }
        .await;
        (result, warnings)
    }

    /// Wait until every process that wants instances has one running.
    ///
    /// Warnings from each poll are sent on `warnings_tx` as they arrive rather
    /// than returned, so a caller can relay them while this is still running.
    pub async fn poll_start(
        &self,
        app: &crate::resources::Application,
        warnings_tx: UnboundedSender<Warnings>,
    ) -> Result<(), ActionError> {
        let deadline = deadline_after(self.settings.startup_timeout);

        let mut warnings = Warnings::new();
        let processes = self.cc.get_application_processes(&app.guid, &mut warnings).await;
        let _ = warnings_tx.send(warnings);
        let processes = processes?;

        for process in processes.iter().filter(|p| p.instances > 0) {
            loop {
                if Instant::now() >= deadline {
                    return Err(ActionError::StartupTimeout {
                        name: app.name.clone(),
                    });
                }

                let mut warnings = Warnings::new();
                let instances = self.cc.get_process_instances(&process.guid, &mut warnings).await;
                let _ = warnings_tx.send(warnings);
                let instances = instances?;

                if instances.iter().any(|i| i.state == InstanceState::Running) {
                    debug!(process = %process.process_type, "process running");
                    break;
                }
                if !instances.is_empty() && instances.iter().all(|i| i.state == InstanceState::Crashed) {
                    return Err(ActionError::AllInstancesCrashed {
                        process_type: process.process_type.clone(),
                    });
                }
                sleep(self.settings.polling_interval).await;
            }
        }
        Ok(())
    }
}
