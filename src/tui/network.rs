// Background network actor for the TUI. Owns the API client and the
// assignment coordinator; every mutation that succeeds is followed by a
// full refetch so the UI never patches its copies locally.
use crate::client::{ApiClient, ExportFormat};
use crate::coordinator::{AssignOutcome, AssignmentCoordinator};
use crate::model::Id;
use crate::model::validate::DropPolicy;
use crate::tui::action::{Action, AppEvent};

use std::path::PathBuf;
use tokio::sync::mpsc::{Receiver, Sender};

async fn load_home(client: &ApiClient, event_tx: &Sender<AppEvent>) {
    match client.load_home().await {
        Ok((calendars, subjects)) => {
            let _ = event_tx
                .send(AppEvent::HomeLoaded(calendars, subjects))
                .await;
        }
        Err(e) => {
            let _ = event_tx.send(AppEvent::Error(e)).await;
        }
    }
}

/// Refetches the board and returns the policy of the freshly loaded
/// calendar, which later gestures are validated against.
async fn load_board(
    client: &ApiClient,
    calendar: Id,
    event_tx: &Sender<AppEvent>,
) -> Option<DropPolicy> {
    match client.load_board(calendar).await {
        Ok((cal, subjects, rules, versions)) => {
            let policy = DropPolicy::for_calendar(&cal);
            let _ = event_tx
                .send(AppEvent::BoardLoaded(Box::new((
                    cal, subjects, rules, versions,
                ))))
                .await;
            Some(policy)
        }
        Err(e) => {
            let _ = event_tx.send(AppEvent::Error(e)).await;
            None
        }
    }
}

pub async fn run_network_actor(
    client: ApiClient,
    username: String,
    password: String,
    export_dir: PathBuf,
    mut action_rx: Receiver<Action>,
    event_tx: Sender<AppEvent>,
) {
    let coordinator = AssignmentCoordinator::new();

    // Session bootstrap: reuse an existing session, otherwise log in.
    let user = match client.me().await {
        Ok(Some(user)) => Some(user),
        Ok(None) => match client.login(&username, &password).await {
            Ok(user) => Some(user),
            Err(e) => {
                let _ = event_tx.send(AppEvent::Error(format!("Login failed: {}", e))).await;
                None
            }
        },
        Err(e) => {
            let _ = event_tx.send(AppEvent::Error(e)).await;
            None
        }
    };

    if let Some(user) = user {
        let _ = event_tx.send(AppEvent::SessionReady(user)).await;
        load_home(&client, &event_tx).await;
        let _ = event_tx.send(AppEvent::Status("Ready.".to_string())).await;
    }

    // The open calendar, if any, with the policy gestures are checked
    // against.
    let mut current: Option<(Id, DropPolicy)> = None;

    while let Some(action) = action_rx.recv().await {
        match action {
            Action::Quit => break,

            Action::OpenCalendar(id) => {
                current = load_board(&client, id, &event_tx)
                    .await
                    .map(|policy| (id, policy));
            }

            Action::BackHome => {
                current = None;
                load_home(&client, &event_tx).await;
            }

            Action::Refresh => {
                let _ = event_tx.send(AppEvent::Status("Refreshing...".to_string())).await;
                match current {
                    Some((id, _)) => {
                        current = load_board(&client, id, &event_tx)
                            .await
                            .map(|policy| (id, policy));
                    }
                    None => load_home(&client, &event_tx).await,
                }
                let _ = event_tx.send(AppEvent::Status("Refreshed.".to_string())).await;
            }

            Action::CreateCalendar(new_cal) => match client.create_calendar(&new_cal).await {
                Ok(cal) => {
                    let _ = event_tx
                        .send(AppEvent::Status(format!("Created '{}'.", cal.name)))
                        .await;
                    load_home(&client, &event_tx).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e)).await;
                }
            },

            Action::DeleteCalendar(id) => match client.delete_calendar(id).await {
                Ok(()) => {
                    let _ = event_tx.send(AppEvent::Status("Calendar deleted.".to_string())).await;
                    load_home(&client, &event_tx).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e)).await;
                }
            },

            Action::CreateSubject(new_subject) => {
                match client.create_subject(&new_subject).await {
                    Ok(_) => {
                        let _ = event_tx.send(AppEvent::Status("Subject created.".to_string())).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::ToggleHeavy(id, heavy) => {
                let patch = crate::model::SubjectPatch {
                    is_heavy: Some(heavy),
                    ..Default::default()
                };
                match client.update_subject(id, &patch).await {
                    Ok(_) => {
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::DeleteSubject(id) => match client.delete_subject(id).await {
                Ok(()) => {
                    let _ = event_tx.send(AppEvent::Status("Subject deleted.".to_string())).await;
                    current = reload(&client, current, &event_tx).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e)).await;
                }
            },

            Action::Assign(gesture) => {
                let Some((calendar, policy)) = &current else {
                    continue;
                };
                match coordinator.assign(&client, policy, *calendar, &gesture).await {
                    Ok(AssignOutcome::Saved) => {
                        let _ = event_tx.send(AppEvent::Status("Saved.".to_string())).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Ok(AssignOutcome::SavedWithWarning(msg)) => {
                        let _ = event_tx.send(AppEvent::Warning(msg)).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    // An identical gesture is already on its way; drop this one.
                    Ok(AssignOutcome::Duplicate) => {}
                    // No reload: the board was never changed, redrawing it
                    // reverts the gesture visually.
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.message())).await;
                    }
                }
            }

            Action::RemoveEvent(event) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                match client.remove_event(calendar, event).await {
                    Ok(()) => {
                        let _ = event_tx.send(AppEvent::Status("Exam removed.".to_string())).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::ToggleBlockedDay(date) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                match client.toggle_blocked_day(calendar, date).await {
                    Ok(blocked) => {
                        let msg = if blocked { "Day blocked." } else { "Day unblocked." };
                        let _ = event_tx.send(AppEvent::Status(msg.to_string())).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::SaveVersion(label) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                match client.save_version(calendar, &label).await {
                    Ok(version) => {
                        let _ = event_tx
                            .send(AppEvent::Status(format!(
                                "Saved version {}.",
                                version.version_number
                            )))
                            .await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::RestoreVersion(version) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                match client.restore_version(calendar, version).await {
                    Ok(()) => {
                        let _ = event_tx.send(AppEvent::Status("Version restored.".to_string())).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::DeleteVersion(version) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                match client.delete_version(calendar, version).await {
                    Ok(()) => {
                        let _ = event_tx.send(AppEvent::Status("Version deleted.".to_string())).await;
                        current = reload(&client, current, &event_tx).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::CreateRule(draft) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                match draft.build(calendar) {
                    Ok(new_rule) => match client.create_rule(&new_rule).await {
                        Ok(_) => {
                            let _ = event_tx.send(AppEvent::Status("Rule created.".to_string())).await;
                            current = reload(&client, current, &event_tx).await;
                        }
                        Err(e) => {
                            let _ = event_tx.send(AppEvent::Error(e)).await;
                        }
                    },
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }

            Action::DeleteRule(id) => match client.delete_rule(id).await {
                Ok(()) => {
                    let _ = event_tx.send(AppEvent::Status("Rule deleted.".to_string())).await;
                    current = reload(&client, current, &event_tx).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e)).await;
                }
            },

            Action::Export(format, version_id) => {
                let Some(calendar) = current.as_ref().map(|c| c.0) else { continue };
                let _ = event_tx.send(AppEvent::Status("Exporting...".to_string())).await;
                match client.export(calendar, format, version_id).await {
                    Ok(bytes) => {
                        let name = format!(
                            "exam-calendar-{}.{}",
                            calendar,
                            format.file_extension()
                        );
                        let path = export_dir.join(name);
                        match std::fs::write(&path, &bytes) {
                            Ok(()) => {
                                let _ = event_tx.send(AppEvent::ExportSaved(path)).await;
                            }
                            Err(e) => {
                                let _ = event_tx
                                    .send(AppEvent::Error(format!("Could not write export: {}", e)))
                                    .await;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e)).await;
                    }
                }
            }
        }
    }
}

/// Refetches whichever view is active and keeps the cached policy fresh.
async fn reload(
    client: &ApiClient,
    current: Option<(Id, DropPolicy)>,
    event_tx: &Sender<AppEvent>,
) -> Option<(Id, DropPolicy)> {
    match current {
        Some((id, old_policy)) => match load_board(client, id, event_tx).await {
            Some(policy) => Some((id, policy)),
            None => Some((id, old_policy)),
        },
        None => {
            load_home(client, event_tx).await;
            None
        }
    }
}
